//! Tool catalogue and dispatch
//!
//! Every tool takes a flat JSON object of named parameters and answers with
//! text: pretty-printed JSON on success, `{"error": "..."}` on any failure.

use crate::metrics::{Metrics, Outcome};
use crate::search::{EverythingSearch, QueryConfig, SearchError};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Tool};
use rmcp::{tool, tool_router, ErrorData as McpError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// Text produced by a tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    fn error(message: impl std::fmt::Display) -> Self {
        Self {
            text: json!({ "error": message.to_string() }).to_string(),
            is_error: true,
        }
    }

    /// The same text as a single-item MCP tool result
    pub fn into_call_result(self) -> CallToolResult {
        let content = vec![Content::text(self.text)];
        if self.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

#[derive(Debug, Error)]
enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid parameters: {0}")]
    InvalidParams(serde_json::Error),
    #[error("{0}")]
    Search(#[from] SearchError),
    #[error("Failed to serialize results: {0}")]
    Serialize(serde_json::Error),
}

fn default_max_results() -> u32 {
    20
}
fn default_true() -> bool {
    true
}
fn default_tool_timeout() -> u64 {
    30000
}
fn default_days() -> u32 {
    7
}
fn sort_by_name() -> String {
    "name".to_string()
}
fn sort_by_size() -> String {
    "size".to_string()
}
fn sort_by_date_modified() -> String {
    "date-modified".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchFilesParams {
    /// Search query string
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_true")]
    pub include_size: bool,
    #[serde(default = "default_true")]
    pub include_date_modified: bool,
    /// name, path, size, extension, date-created, date-modified, ...
    #[serde(default = "sort_by_name")]
    pub sort_by: String,
    /// Timeout in milliseconds
    #[serde(default = "default_tool_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchFoldersParams {
    /// Search query string
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "sort_by_name")]
    pub sort_by: String,
    /// Timeout in milliseconds
    #[serde(default = "default_tool_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchByExtensionParams {
    /// File extension without the dot, e.g. "py"
    pub extension: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_true")]
    pub include_size: bool,
    #[serde(default = "default_true")]
    pub include_date_modified: bool,
    #[serde(default = "sort_by_name")]
    pub sort_by: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchBySizeParams {
    /// Everything size expression, e.g. ">100MB", "<1KB", "1GB..5GB"
    pub size_filter: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_true")]
    pub include_date_modified: bool,
    #[serde(default = "sort_by_size")]
    pub sort_by: String,
    #[serde(default)]
    pub sort_ascending: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchRecentParams {
    /// How many days back to look
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_true")]
    pub include_size: bool,
    #[serde(default = "sort_by_date_modified")]
    pub sort_by: String,
    #[serde(default)]
    pub sort_ascending: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AdvancedSearchParams {
    /// Search query string
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub whole_words: bool,
    #[serde(default)]
    pub match_path: bool,
    #[serde(default)]
    pub files_only: bool,
    #[serde(default)]
    pub folders_only: bool,
    /// Search within this path
    #[serde(default)]
    pub path_filter: Option<String>,
    #[serde(default = "default_true")]
    pub include_size: bool,
    #[serde(default = "default_true")]
    pub include_extension: bool,
    #[serde(default = "default_true")]
    pub include_date_modified: bool,
    #[serde(default = "sort_by_name")]
    pub sort_by: String,
    #[serde(default = "default_true")]
    pub sort_ascending: bool,
    /// Timeout in milliseconds
    #[serde(default = "default_tool_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResultCountParams {
    /// Search query string
    pub query: String,
}

/// The search tools, served over MCP and through the web server's `/tools`
#[derive(Clone)]
pub struct EverythingTools {
    everything: EverythingSearch,
    metrics: Option<Arc<Metrics>>,
    pub(super) tool_router: ToolRouter<Self>,
}

#[tool_router]
impl EverythingTools {
    pub fn new(everything: EverythingSearch) -> Self {
        Self {
            everything,
            metrics: None,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Search files and folders with every Everything option available.")]
    async fn search(
        &self,
        Parameters(config): Parameters<QueryConfig>,
    ) -> Result<CallToolResult, McpError> {
        let output = self.record("search", self.run_search(config)).await;
        Ok(output.into_call_result())
    }

    #[tool(description = "Search for files using Everything Search. Returns JSON search results.")]
    async fn search_files(
        &self,
        Parameters(params): Parameters<SearchFilesParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self.record("search_files", self.run_search_files(params)).await;
        Ok(output.into_call_result())
    }

    #[tool(description = "Search for folders using Everything Search. Returns JSON search results.")]
    async fn search_folders(
        &self,
        Parameters(params): Parameters<SearchFoldersParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self
            .record("search_folders", self.run_search_folders(params))
            .await;
        Ok(output.into_call_result())
    }

    #[tool(description = "Search for files by extension, e.g. \"py\", \"txt\", \"exe\".")]
    async fn search_by_extension(
        &self,
        Parameters(params): Parameters<SearchByExtensionParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self
            .record("search_by_extension", self.run_search_by_extension(params))
            .await;
        Ok(output.into_call_result())
    }

    #[tool(
        description = "Search for files by size, e.g. \">100MB\", \"<1KB\", \"1GB..5GB\". Largest first by default."
    )]
    async fn search_by_size(
        &self,
        Parameters(params): Parameters<SearchBySizeParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self
            .record("search_by_size", self.run_search_by_size(params))
            .await;
        Ok(output.into_call_result())
    }

    #[tool(description = "Search for files modified in the last N days. Newest first by default.")]
    async fn search_recent_files(
        &self,
        Parameters(params): Parameters<SearchRecentParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self
            .record("search_recent_files", self.run_search_recent(params))
            .await;
        Ok(output.into_call_result())
    }

    #[tool(description = "Search with full control over matching, filtering and sorting.")]
    async fn advanced_search(
        &self,
        Parameters(params): Parameters<AdvancedSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self
            .record("advanced_search", self.run_advanced_search(params))
            .await;
        Ok(output.into_call_result())
    }

    #[tool(description = "Count the results of a query without fetching them.")]
    async fn get_result_count(
        &self,
        Parameters(params): Parameters<ResultCountParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self
            .record("get_result_count", self.run_result_count(params))
            .await;
        Ok(output.into_call_result())
    }

    #[tool(description = "Get the version of the Everything command-line tool.")]
    async fn get_everything_version(&self) -> Result<CallToolResult, McpError> {
        let output = self
            .record("get_everything_version", self.run_version())
            .await;
        Ok(output.into_call_result())
    }
}

impl EverythingTools {
    /// Record every call in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// All tools, with their input schemas
    pub fn definitions(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    /// Call a tool by name with a JSON object of arguments.
    ///
    /// Never fails; errors become an error object.
    pub async fn call(&self, name: &str, arguments: Value) -> ToolOutput {
        let arguments = match arguments {
            Value::Null => json!({}),
            other => other,
        };
        debug!("Tool call {} with {}", name, arguments);
        self.record(name, self.dispatch(name, arguments)).await
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        match name {
            "search" => self.run_search(params(arguments)?).await,
            "search_files" => self.run_search_files(params(arguments)?).await,
            "search_folders" => self.run_search_folders(params(arguments)?).await,
            "search_by_extension" => self.run_search_by_extension(params(arguments)?).await,
            "search_by_size" => self.run_search_by_size(params(arguments)?).await,
            "search_recent_files" => self.run_search_recent(params(arguments)?).await,
            "advanced_search" => self.run_advanced_search(params(arguments)?).await,
            "get_result_count" => self.run_result_count(params(arguments)?).await,
            "get_everything_version" => self.run_version().await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    async fn record<F>(&self, name: &str, call: F) -> ToolOutput
    where
        F: Future<Output = Result<String, ToolError>>,
    {
        let start = Instant::now();
        let result = call.await;

        let outcome = match &result {
            Ok(_) => Outcome::Success,
            Err(ToolError::Search(e)) if e.is_timeout() => Outcome::Timeout,
            Err(_) => Outcome::Failure,
        };
        if let Some(metrics) = &self.metrics {
            metrics.record(name, start.elapsed(), outcome);
        }

        match result {
            Ok(text) => ToolOutput {
                text,
                is_error: false,
            },
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                ToolOutput::error(e)
            }
        }
    }

    async fn run_search(&self, config: QueryConfig) -> Result<String, ToolError> {
        render(&self.everything.search(&config).await?)
    }

    async fn run_search_files(&self, p: SearchFilesParams) -> Result<String, ToolError> {
        let config = QueryConfig {
            query: p.query,
            max_results: Some(p.max_results),
            regex: p.regex,
            case_sensitive: p.case_sensitive,
            include_size: p.include_size,
            include_date_modified: p.include_date_modified,
            include_full_path: true,
            sort_by: Some(p.sort_by),
            timeout_ms: p.timeout,
            ..Default::default()
        };
        render(&self.everything.search_files(config).await?)
    }

    async fn run_search_folders(&self, p: SearchFoldersParams) -> Result<String, ToolError> {
        let config = QueryConfig {
            query: p.query,
            max_results: Some(p.max_results),
            regex: p.regex,
            case_sensitive: p.case_sensitive,
            include_full_path: true,
            sort_by: Some(p.sort_by),
            timeout_ms: p.timeout,
            ..Default::default()
        };
        render(&self.everything.search_folders(config).await?)
    }

    async fn run_search_by_extension(
        &self,
        p: SearchByExtensionParams,
    ) -> Result<String, ToolError> {
        let config = QueryConfig {
            max_results: Some(p.max_results),
            include_size: p.include_size,
            include_date_modified: p.include_date_modified,
            include_full_path: true,
            sort_by: Some(p.sort_by),
            ..Default::default()
        };
        render(&self.everything.search_by_extension(&p.extension, config).await?)
    }

    async fn run_search_by_size(&self, p: SearchBySizeParams) -> Result<String, ToolError> {
        let config = QueryConfig {
            max_results: Some(p.max_results),
            include_date_modified: p.include_date_modified,
            include_full_path: true,
            sort_by: Some(p.sort_by),
            sort_ascending: p.sort_ascending,
            ..Default::default()
        };
        render(&self.everything.search_by_size(&p.size_filter, config).await?)
    }

    async fn run_search_recent(&self, p: SearchRecentParams) -> Result<String, ToolError> {
        let config = QueryConfig {
            max_results: Some(p.max_results),
            include_size: p.include_size,
            include_full_path: true,
            sort_by: Some(p.sort_by),
            sort_ascending: p.sort_ascending,
            ..Default::default()
        };
        render(&self.everything.search_recent(p.days, config).await?)
    }

    async fn run_advanced_search(&self, p: AdvancedSearchParams) -> Result<String, ToolError> {
        let config = QueryConfig {
            query: p.query,
            max_results: Some(p.max_results),
            regex: p.regex,
            case_sensitive: p.case_sensitive,
            whole_words: p.whole_words,
            match_path: p.match_path,
            files_only: p.files_only,
            folders_only: p.folders_only,
            path_filter: p.path_filter,
            include_name: true,
            include_full_path: true,
            include_size: p.include_size,
            include_extension: p.include_extension,
            include_date_modified: p.include_date_modified,
            sort_by: Some(p.sort_by),
            sort_ascending: p.sort_ascending,
            timeout_ms: p.timeout,
            ..Default::default()
        };
        render(&self.everything.search(&config).await?)
    }

    async fn run_result_count(&self, p: ResultCountParams) -> Result<String, ToolError> {
        let count = self.everything.result_count(&p.query).await;
        Ok(json!({ "query": p.query, "count": count }).to_string())
    }

    async fn run_version(&self) -> Result<String, ToolError> {
        let version = self.everything.version().await?;
        Ok(json!({ "version": version }).to_string())
    }
}

fn params<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(ToolError::InvalidParams)
}

fn render<T: Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value).map_err(ToolError::Serialize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::stub::{Reply, StubRunner};
    use crate::search::{ProcessOutput, FILES_ONLY, FOLDERS_ONLY};
    use std::collections::BTreeSet;

    const TOOL_NAMES: [&str; 9] = [
        "search",
        "search_files",
        "search_folders",
        "search_by_extension",
        "search_by_size",
        "search_recent_files",
        "advanced_search",
        "get_result_count",
        "get_everything_version",
    ];

    fn tools(runner: &StubRunner) -> EverythingTools {
        let search =
            EverythingSearch::with_runner(std::env::current_exe().unwrap(), Arc::new(runner.clone()))
                .unwrap();
        EverythingTools::new(search)
    }

    fn parse(output: &ToolOutput) -> Value {
        serde_json::from_str(&output.text).unwrap()
    }

    fn call_text(result: &CallToolResult) -> String {
        result.content[0].as_text().unwrap().text.clone()
    }

    #[test]
    fn test_definitions() {
        let runner = StubRunner::new();
        let definitions = tools(&runner).definitions();

        let names: BTreeSet<String> = definitions.iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names, TOOL_NAMES.iter().map(|n| n.to_string()).collect());

        let by_extension = definitions
            .iter()
            .find(|t| t.name == "search_by_extension")
            .unwrap();
        let schema = serde_json::to_value(by_extension).unwrap();
        assert_eq!(schema["inputSchema"]["required"], json!(["extension"]));
        assert!(schema["inputSchema"]["properties"]["max_results"].is_object());
    }

    #[tokio::test]
    async fn test_every_definition_dispatches() {
        let runner = StubRunner::new();
        let tools = tools(&runner);
        let arguments = json!({ "query": "x", "extension": "py", "size_filter": ">1MB" });

        for name in TOOL_NAMES {
            let output = tools.call(name, arguments.clone()).await;
            assert!(!output.text.contains("Unknown tool"), "{} not dispatched", name);
        }
    }

    #[tokio::test]
    async fn test_search_files_defaults() {
        let runner = StubRunner::new().stdout("Name,Full Path & Name,Size\na.txt,C:\\a.txt,12");
        let output = tools(&runner).call("search_files", json!({ "query": "a" })).await;

        assert!(!output.is_error);
        assert_eq!(
            parse(&output),
            json!([{ "Name": "a.txt", "Full Path & Name": "C:\\a.txt", "Size": 12 }])
        );

        let args = runner.last_args();
        assert_eq!(args.args()[0], "a");
        assert_eq!(args.value_of("-max-results"), Some("20"));
        assert_eq!(args.value_of("-sort"), Some("name-ascending"));
        assert_eq!(args.value_of("-timeout"), Some("30000"));
        assert!(args.contains(FILES_ONLY));
        assert!(args.contains("-full-path-and-name"));
        assert!(args.contains("-size"));
        assert!(args.contains("-date-modified"));
    }

    #[tokio::test]
    async fn test_tool_methods_share_dispatch() {
        let runner = StubRunner::new()
            .stdout("Filename\nC:\\x.py")
            .reply(Reply::Output(ProcessOutput::failed(1, "no IPC")));
        let tools = tools(&runner);

        let params: SearchByExtensionParams =
            serde_json::from_value(json!({ "extension": "py" })).unwrap();
        let result = tools
            .search_by_extension(Parameters(params))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        let value: Value = serde_json::from_str(&call_text(&result)).unwrap();
        assert_eq!(value, json!([{ "Filename": "C:\\x.py" }]));
        assert_eq!(runner.last_args().args()[0], "ext:py");

        let result = tools.get_everything_version().await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            call_text(&result),
            r#"{"error":"Everything Search failed: no IPC"}"#
        );
    }

    #[tokio::test]
    async fn test_search_folders() {
        let runner = StubRunner::new();
        let output = tools(&runner).call("search_folders", Value::Null).await;
        assert_eq!(parse(&output), json!([]));
        assert!(runner.last_args().contains(FOLDERS_ONLY));
    }

    #[tokio::test]
    async fn test_generic_search_takes_query_config_fields() {
        let runner = StubRunner::new();
        tools(&runner)
            .call(
                "search",
                json!({ "query": "x", "parent": "C:\\Temp", "attributes": "H", "timeout": 900 }),
            )
            .await;
        let args = runner.last_args();
        assert_eq!(args.value_of("-parent"), Some("C:\\Temp"));
        assert!(args.contains("/aH"));
        assert_eq!(args.value_of("-timeout"), Some("900"));
    }

    #[tokio::test]
    async fn test_size_and_recent_tools() {
        let runner = StubRunner::new();
        let tools = tools(&runner);

        tools.call("search_by_size", json!({ "size_filter": ">100MB" })).await;
        let args = runner.last_args();
        assert_eq!(args.args()[0], "size:>100MB");
        assert_eq!(args.value_of("-sort"), Some("size-descending"));

        tools.call("search_recent_files", json!({ "days": 2 })).await;
        let args = runner.last_args();
        assert_eq!(args.args()[0], "datemodified:last2days");
        assert_eq!(args.value_of("-sort"), Some("date-modified-descending"));

        tools.call("search_by_extension", json!({ "extension": "py" })).await;
        assert_eq!(runner.last_args().args()[0], "ext:py");
    }

    #[tokio::test]
    async fn test_advanced_search() {
        let runner = StubRunner::new();
        tools(&runner)
            .call(
                "advanced_search",
                json!({ "query": "marvel", "path_filter": "Z:\\30.comix", "whole_words": true }),
            )
            .await;
        let args = runner.last_args();
        assert_eq!(args.value_of("-path"), Some("Z:\\30.comix"));
        assert!(args.contains("-whole-words"));
        assert!(args.contains("-name"));
        assert!(args.contains("-extension"));
    }

    #[tokio::test]
    async fn test_count_and_version() {
        let runner = StubRunner::new().stdout("42").stdout("1.1.0.30\n");
        let tools = tools(&runner);

        let count = tools.call("get_result_count", json!({ "query": "*.txt" })).await;
        assert_eq!(parse(&count), json!({ "query": "*.txt", "count": 42 }));

        let version = tools.call("get_everything_version", json!({})).await;
        assert_eq!(parse(&version), json!({ "version": "1.1.0.30" }));
    }

    #[tokio::test]
    async fn test_errors_become_error_objects() {
        let runner = StubRunner::new()
            .reply(Reply::Output(ProcessOutput::failed(1, "Everything IPC window not found")))
            .reply(Reply::Timeout);
        let metrics = Arc::new(Metrics::new());
        let tools = tools(&runner).with_metrics(metrics.clone());

        let failed = tools.call("search_files", json!({})).await;
        assert!(failed.is_error);
        assert_eq!(
            parse(&failed),
            json!({ "error": "Everything Search failed: Everything IPC window not found" })
        );

        let timed_out = tools.call("search_files", json!({ "timeout": 100 })).await;
        assert!(timed_out.is_error);
        assert_eq!(
            parse(&timed_out),
            json!({ "error": "Search timed out after 100ms" })
        );

        let missing = tools.call("search_by_extension", json!({})).await;
        assert!(missing.is_error);
        assert!(parse(&missing)["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid parameters"));

        let unknown = tools.call("delete_everything", json!({})).await;
        assert_eq!(parse(&unknown), json!({ "error": "Unknown tool: delete_everything" }));

        let stats = metrics.operation_stats("search_files").unwrap();
        assert_eq!(stats.calls, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.timeouts, 1);
    }
}
