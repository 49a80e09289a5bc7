//! Tool-invocation protocol adapter
//!
//! Exposes each search operation as a named MCP tool for LLM clients, over
//! stdio or through the web server's `/tools` routes.

mod server;
mod tools;

pub use server::serve_stdio;
pub use tools::{
    AdvancedSearchParams, EverythingTools, ResultCountParams, SearchByExtensionParams,
    SearchBySizeParams, SearchFilesParams, SearchFoldersParams, SearchRecentParams, ToolOutput,
};
