//! Search query and related data models

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete description of one es search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct QueryConfig {
    /// Search text; empty matches everything
    pub query: String,
    /// Treat `query` as a regular expression
    pub regex: bool,
    /// Match case
    pub case_sensitive: bool,
    /// Match whole words only
    pub whole_words: bool,
    /// Match against the full path as well as the name
    pub match_path: bool,
    /// Match diacritical marks
    pub match_diacritics: bool,
    /// Maximum number of results
    pub max_results: Option<u32>,
    /// Index of the first result to return
    pub offset: u32,
    /// Search within this path
    pub path_filter: Option<String>,
    /// Search in the parent of this path
    pub parent_path: Option<String>,
    /// Only results whose parent is this path
    pub parent: Option<String>,
    /// Return only folders (takes precedence over `files_only`)
    pub folders_only: bool,
    /// Return only files
    pub files_only: bool,
    /// DIR-style attribute filter, e.g. "RHSD"
    pub attributes: Option<String>,
    /// Sort field (name, path, size, extension, date-modified, ...)
    pub sort_by: Option<String>,
    pub sort_ascending: bool,
    pub include_name: bool,
    pub include_path: bool,
    pub include_full_path: bool,
    pub include_extension: bool,
    pub include_size: bool,
    pub include_date_created: bool,
    pub include_date_modified: bool,
    pub include_date_accessed: bool,
    pub include_attributes: bool,
    /// Timeout forwarded to es, in milliseconds
    #[serde(alias = "timeout")]
    pub timeout_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            regex: false,
            case_sensitive: false,
            whole_words: false,
            match_path: false,
            match_diacritics: false,
            max_results: None,
            offset: 0,
            path_filter: None,
            parent_path: None,
            parent: None,
            folders_only: false,
            files_only: false,
            attributes: None,
            sort_by: None,
            sort_ascending: true,
            include_name: true,
            include_path: false,
            include_full_path: false,
            include_extension: false,
            include_size: false,
            include_date_created: false,
            include_date_modified: false,
            include_date_accessed: false,
            include_attributes: false,
            timeout_ms: crate::DEFAULT_TIMEOUT_MS,
        }
    }
}

impl QueryConfig {
    /// Create a query for a search string with default options
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the search string
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Enable regex matching
    pub fn with_regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    /// Enable case-sensitive matching
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Limit the number of results
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Restrict the search to a path
    pub fn with_path_filter(mut self, path: impl Into<String>) -> Self {
        self.path_filter = Some(path.into());
        self
    }

    /// Sort by a field
    pub fn with_sort(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.sort_by = Some(field.into());
        self.sort_ascending = ascending;
        self
    }

    pub fn files_only(mut self) -> Self {
        self.files_only = true;
        self
    }

    pub fn folders_only(mut self) -> Self {
        self.folders_only = true;
        self
    }

    /// Set the forwarded timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Whether both type filters were requested
    pub fn has_conflicting_type_filter(&self) -> bool {
        self.files_only && self.folders_only
    }
}

/// Formats es can export to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values
    #[default]
    Csv,
    /// Tab-separated values
    Tsv,
    /// Plain list of full paths
    Txt,
    /// M3U playlist
    M3u,
    /// UTF-8 M3U playlist
    M3u8,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Csv,
        ExportFormat::Tsv,
        ExportFormat::Txt,
        ExportFormat::M3u,
        ExportFormat::M3u8,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Txt => "txt",
            Self::M3u => "m3u",
            Self::M3u8 => "m3u8",
        }
    }

    /// The es flag selecting this format
    pub fn flag(&self) -> String {
        format!("-export-{}", self.as_str())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown export format: {}", s))
    }
}

/// A request to have es write its results straight to a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub query: String,
    pub output_file: PathBuf,
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub max_results: Option<u32>,
}

impl ExportRequest {
    pub fn new(query: impl Into<String>, output_file: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            query: query.into(),
            output_file: output_file.into(),
            format,
            regex: false,
            case_sensitive: false,
            max_results: None,
        }
    }
}
