//! Search module
//!
//! Turns a [`QueryConfig`] into an es argument list, runs es, and parses
//! its CSV output.

mod args;
mod error;
mod executor;
mod models;
mod runner;

pub use args::{
    log_arguments, ArgsHook, ArgumentBuilder, ArgumentList, ATTRIBUTE_PREFIX, CSV_OUTPUT,
    FILES_ONLY, FOLDERS_ONLY,
};
pub use error::SearchError;
pub use executor::EverythingSearch;
pub use models::*;
pub use runner::{CommandRunner, ProcessOutput, ProcessRunner};

#[cfg(test)]
pub(crate) use runner::stub;
