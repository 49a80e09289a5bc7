//! Running es as a subprocess

use super::args::ArgumentList;
use super::error::SearchError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Everything a finished es process left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    pub success: bool,
    /// Standard output, invalid UTF-8 replaced
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// A successful run printing `stdout`
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and diagnostics
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Turn a non-zero exit into [`SearchError::ExecutionFailed`]
    pub fn into_result(self) -> Result<String, SearchError> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(SearchError::ExecutionFailed {
                code: self.code,
                stderr: self.stderr,
            })
        }
    }
}

/// Executes an argument list and collects its output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion, aborting once `deadline` has passed.
    ///
    /// A timeout reports the deadline itself; callers that know the
    /// forwarded timeout substitute it.
    async fn run(&self, args: &ArgumentList, deadline: Duration)
        -> Result<ProcessOutput, SearchError>;
}

/// Runs es as a real child process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        args: &ArgumentList,
        deadline: Duration,
    ) -> Result<ProcessOutput, SearchError> {
        let start = Instant::now();
        let child = Command::new(args.program())
            .args(args.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match timeout(deadline, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!("es did not finish within {:?}, killed", deadline);
                return Err(SearchError::Timeout {
                    timeout_ms: deadline.as_millis() as u64,
                });
            }
        };

        debug!(
            "es exited with {:?} after {:?} ({} bytes of output)",
            output.status.code(),
            start.elapsed(),
            output.stdout.len()
        );

        Ok(ProcessOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> ArgumentList {
        ArgumentList::from_parts("/bin/sh", ["-c", script])
    }

    #[tokio::test]
    async fn test_collects_stdout() {
        let output = ProcessRunner
            .run(&shell("printf 'Filename\\nC:\\\\a.txt\\n'"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(output.code, Some(0));
        assert_eq!(output.stdout, "Filename\nC:\\a.txt\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_stderr() {
        let output = ProcessRunner
            .run(&shell("echo 'Error 8: bad switch' >&2; exit 3"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));

        match output.into_result() {
            Err(SearchError::ExecutionFailed { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "Error 8: bad switch");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let output = ProcessRunner
            .run(&shell("printf 'a\\377b'"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(output.stdout, "a\u{FFFD}b");
    }

    #[tokio::test]
    async fn test_deadline_kills_process() {
        let start = Instant::now();
        let err = ProcessRunner
            .run(&shell("sleep 10"), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Timeout { timeout_ms: 200 }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let args = ArgumentList::from_parts("/definitely/not/here/es.exe", ["-version"]);
        let err = ProcessRunner
            .run(&args, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Spawn(_)));
    }
}
