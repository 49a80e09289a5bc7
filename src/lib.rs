//! Everything Search: a structured query API over the Everything `es` CLI
//!
//! Builds `es` argument lists from typed query configurations, runs the
//! executable with a host-level deadline, and parses its CSV output into
//! records. The same operations are exposed as LLM tools over JSON-RPC and
//! through a small web UI.

pub mod config;
pub mod mcp;
pub mod metrics;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use results::{parse_csv, FieldValue, ResultRecord, ResultSet};
pub use search::{EverythingSearch, ExportFormat, ExportRequest, QueryConfig, SearchError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where es.exe lives in a default install, as seen from WSL
pub const DEFAULT_ES_PATH: &str = "/mnt/c/Program Files/Everything/es.exe";

/// Timeout forwarded to es when the caller gives none, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
