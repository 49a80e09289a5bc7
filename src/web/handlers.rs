//! HTTP request handlers

use super::state::AppState;
use crate::metrics::Outcome;
use crate::results::ResultSet;
use crate::search::{QueryConfig, SearchError};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use tera::Context;

/// Sort fields offered in the search form
const SORT_FIELDS: &[&str] = &[
    "name",
    "path",
    "size",
    "extension",
    "date-created",
    "date-modified",
    "date-accessed",
    "attributes",
];

/// Query parameters for search, as sent by the HTML form
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Search text (or extension / size filter, depending on `kind`)
    pub q: Option<String>,
    /// all, files, folders, extension, size, recent
    pub kind: Option<String>,
    /// Days for `kind=recent`
    pub days: Option<String>,
    pub regex: Option<String>,
    pub case: Option<String>,
    pub whole_words: Option<String>,
    pub match_path: Option<String>,
    /// Search within this path
    pub path: Option<String>,
    pub max_results: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
    pub descending: Option<String>,
    /// Output format: html (default) or json
    pub format: Option<String>,
}

/// Checkbox values arrive as "on"; API callers may send "true" or "1"
fn flag(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("on" | "true" | "1"))
}

/// Numeric form fields may arrive empty or garbled; those count as absent
fn number<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Search kinds the UI and API understand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchKind {
    All,
    Files,
    Folders,
    Extension,
    Size,
    Recent,
}

impl SearchKind {
    fn parse(kind: Option<&str>) -> Self {
        match kind {
            Some("files") => Self::Files,
            Some("folders") => Self::Folders,
            Some("extension") => Self::Extension,
            Some("size") => Self::Size,
            Some("recent") => Self::Recent,
            _ => Self::All,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Files => "files",
            Self::Folders => "folders",
            Self::Extension => "extension",
            Self::Size => "size",
            Self::Recent => "recent",
        }
    }

    fn operation(&self) -> &'static str {
        match self {
            Self::All => "web_search",
            Self::Files => "web_search_files",
            Self::Folders => "web_search_folders",
            Self::Extension => "web_search_by_extension",
            Self::Size => "web_search_by_size",
            Self::Recent => "web_search_recent",
        }
    }
}

impl SearchParams {
    /// Build the query configuration the form describes
    fn to_config(&self, state: &AppState) -> QueryConfig {
        let max_results =
            number(&self.max_results).or(Some(state.settings.ui.default_max_results));

        QueryConfig {
            query: self.q.clone().unwrap_or_default(),
            regex: flag(&self.regex),
            case_sensitive: flag(&self.case),
            whole_words: flag(&self.whole_words),
            match_path: flag(&self.match_path),
            max_results,
            offset: number(&self.offset).unwrap_or(0),
            path_filter: non_blank(self.path.clone()),
            sort_by: non_blank(self.sort.clone()),
            sort_ascending: !flag(&self.descending),
            include_name: true,
            include_path: true,
            include_size: true,
            include_date_modified: true,
            timeout_ms: state.search.default_timeout_ms(),
            ..Default::default()
        }
    }
}

/// Status code for a failed es call
fn error_status(error: &SearchError) -> StatusCode {
    match error {
        SearchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        SearchError::ExecutionFailed { .. } | SearchError::Spawn(_) => StatusCode::BAD_GATEWAY,
        SearchError::ExecutableNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn outcome<T>(result: &Result<T, SearchError>) -> Outcome {
    match result {
        Ok(_) => Outcome::Success,
        Err(e) if e.is_timeout() => Outcome::Timeout,
        Err(_) => Outcome::Failure,
    }
}

fn render(state: &AppState, template: &str, ctx: &Context) -> Response {
    match state.templates.render_with_context(template, ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Home page handler
pub async fn index(State(state): State<AppState>) -> Response {
    let mut ctx = Context::new();
    ctx.insert("instance_name", state.instance_name());
    ctx.insert("default_max_results", &state.settings.ui.default_max_results);
    ctx.insert("default_files_only", &state.settings.ui.default_files_only);
    ctx.insert("sort_fields", SORT_FIELDS);

    render(&state, "index.html", &ctx)
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let kind = SearchKind::parse(params.kind.as_deref());
    let wants_json = params.format.as_deref() == Some("json");
    let blank = params.q.as_deref().map_or(true, |q| q.trim().is_empty());

    if blank && !wants_json && kind != SearchKind::Recent {
        return Redirect::to("/").into_response();
    }

    let config = params.to_config(&state);
    let start = Instant::now();
    let result = match kind {
        SearchKind::All => state.search.search(&config).await,
        SearchKind::Files => state.search.search_files(config.clone()).await,
        SearchKind::Folders => state.search.search_folders(config.clone()).await,
        SearchKind::Extension => {
            let extension = config.query.trim().trim_start_matches('.').to_string();
            state.search.search_by_extension(&extension, config.clone()).await
        }
        SearchKind::Size => {
            let filter = config.query.trim().to_string();
            state.search.search_by_size(&filter, config.clone()).await
        }
        SearchKind::Recent => {
            let days = number(&params.days).unwrap_or(7);
            state.search.search_recent(days, config.clone()).await
        }
    };
    let elapsed = start.elapsed();
    state
        .metrics
        .record(kind.operation(), elapsed, outcome(&result));

    if wants_json {
        return match result {
            Ok(results) => Json(results).into_response(),
            Err(e) => (error_status(&e), Json(json!({ "error": e.to_string() }))).into_response(),
        };
    }

    let mut ctx = Context::new();
    ctx.insert("instance_name", state.instance_name());
    ctx.insert("query", &config.query);
    ctx.insert("kind", kind.as_str());
    ctx.insert("elapsed_ms", &(elapsed.as_millis() as u64));

    let status = match &result {
        Ok(results) => {
            let (columns, rows) = table(results);
            ctx.insert("error", &None::<String>);
            ctx.insert("result_count", &results.len());
            ctx.insert("columns", &columns);
            ctx.insert("rows", &rows);
            StatusCode::OK
        }
        Err(e) => {
            ctx.insert("error", &Some(e.to_string()));
            ctx.insert("result_count", &0);
            ctx.insert("columns", &Vec::<String>::new());
            ctx.insert("rows", &Vec::<Vec<String>>::new());
            error_status(e)
        }
    };

    (status, render(&state, "search.html", &ctx)).into_response()
}

/// Column headers and display rows for the results table
fn table(results: &ResultSet) -> (Vec<String>, Vec<Vec<String>>) {
    let columns = results
        .first()
        .map(|r| r.columns().map(str::to_string).collect())
        .unwrap_or_default();
    let rows = results
        .iter()
        .map(|r| r.values().map(|v| v.to_string()).collect())
        .collect();
    (columns, rows)
}

/// About page handler
pub async fn about(State(state): State<AppState>) -> Response {
    let es_version = match state.search.version().await {
        Ok(version) => version,
        Err(e) => format!("unavailable ({})", e),
    };

    let mut ctx = Context::new();
    ctx.insert("instance_name", state.instance_name());
    ctx.insert("version", crate::VERSION);
    ctx.insert("es_path", &state.search.es_path().display().to_string());
    ctx.insert("es_version", &es_version);

    render(&state, "about.html", &ctx)
}

#[derive(Debug, Deserialize)]
pub struct CountParams {
    #[serde(default)]
    pub q: String,
}

/// Result count handler; es failures read as a count of 0, so no metrics
pub async fn count(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> impl IntoResponse {
    let count = state.search.result_count(&params.q).await;
    Json(json!({ "query": params.q, "count": count }))
}

/// es version handler
pub async fn version(State(state): State<AppState>) -> Response {
    let start = Instant::now();
    let result = state.search.version().await;
    state
        .metrics
        .record("web_version", start.elapsed(), outcome(&result));

    match result {
        Ok(version) => Json(json!({ "version": version })).into_response(),
        Err(e) => (error_status(&e), Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

/// Stats handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

/// Tool catalogue handler
pub async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "tools": state.tools.definitions() }))
}

/// Tool invocation handler; failures are reported in the body, not the status
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> impl IntoResponse {
    let arguments = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let output = state.tools.call(&name, arguments).await;
    ([(header::CONTENT_TYPE, "application/json")], output.text)
}

/// Favicon handler
pub async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
