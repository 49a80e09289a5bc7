//! Errors raised while talking to es

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// es is not where the configuration says it is
    #[error("Everything Search executable not found at: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    /// es ran and exited non-zero
    #[error("Everything Search failed: {}", stderr.trim())]
    ExecutionFailed { code: Option<i32>, stderr: String },

    /// es did not finish in time; `timeout_ms` is the timeout the caller asked for
    #[error("Search timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// es could not be started at all
    #[error("Error executing search: {0}")]
    Spawn(#[from] std::io::Error),
}

impl SearchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
