//! Translation of a [`QueryConfig`] into the argument vector es expects
//!
//! es reads its flags positionally relative to the search term, so the
//! order tokens are pushed in here is part of the contract.

use super::models::{ExportRequest, QueryConfig};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix of the DIR-style attribute switch
pub const ATTRIBUTE_PREFIX: &str = "/a";
/// Folders-only attribute switch
pub const FOLDERS_ONLY: &str = "/ad";
/// Files-only attribute switch
pub const FILES_ONLY: &str = "/a-d";
/// Output format es prints for parsing
pub const CSV_OUTPUT: &str = "-csv";

/// Callback observing every argument list before it is used
pub type ArgsHook = Arc<dyn Fn(&ArgumentList) + Send + Sync>;

/// A hook that logs each argument list at debug level
pub fn log_arguments() -> ArgsHook {
    Arc::new(|args: &ArgumentList| debug!("es command: {}", args))
}

/// Ordered tokens for one es invocation; the first is always the executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentList(Vec<String>);

impl ArgumentList {
    fn new(executable: &Path) -> Self {
        Self(vec![executable.to_string_lossy().into_owned()])
    }

    /// A list for any program and arguments
    pub fn from_parts<I, S>(program: impl AsRef<Path>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new(program.as_ref());
        list.0.extend(args.into_iter().map(Into::into));
        list
    }

    fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    fn push_pair(&mut self, flag: &str, value: impl Into<String>) {
        self.0.push(flag.to_string());
        self.0.push(value.into());
    }

    fn push_if(&mut self, enabled: bool, flag: &str) {
        if enabled {
            self.0.push(flag.to_string());
        }
    }

    /// The executable token
    pub fn program(&self) -> &str {
        &self.0[0]
    }

    /// Everything after the executable
    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true; the executable is always present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of the first token equal to `token`
    pub fn position(&self, token: &str) -> Option<usize> {
        self.0.iter().position(|t| t == token)
    }

    /// Token following the first occurrence of `flag`
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.position(flag)
            .and_then(|i| self.0.get(i + 1))
            .map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.position(token).is_some()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for ArgumentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.0.iter().map(|t| format!("{:?}", t)).collect();
        f.write_str(&quoted.join(" "))
    }
}

impl AsRef<[String]> for ArgumentList {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}

/// Builds es argument lists for a fixed executable
#[derive(Clone)]
pub struct ArgumentBuilder {
    executable: PathBuf,
    hook: Option<ArgsHook>,
}

impl fmt::Debug for ArgumentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentBuilder")
            .field("executable", &self.executable)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl ArgumentBuilder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            hook: None,
        }
    }

    /// Attach a hook that sees every list this builder produces
    pub fn with_hook(mut self, hook: ArgsHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments for a search
    pub fn search(&self, config: &QueryConfig) -> ArgumentList {
        let mut args = ArgumentList::new(&self.executable);

        if config.regex {
            args.push_pair("-regex", config.query.as_str());
        } else {
            args.push(config.query.as_str());
        }

        args.push_if(config.case_sensitive, "-case");
        args.push_if(config.whole_words, "-whole-words");
        args.push_if(config.match_path, "-match-path");
        args.push_if(config.match_diacritics, "-diacritics");

        if let Some(max_results) = config.max_results {
            args.push_pair("-max-results", max_results.to_string());
        }
        if config.offset > 0 {
            args.push_pair("-offset", config.offset.to_string());
        }

        if let Some(path) = non_empty(&config.path_filter) {
            args.push_pair("-path", path);
        }
        if let Some(path) = non_empty(&config.parent_path) {
            args.push_pair("-parent-path", path);
        }
        if let Some(path) = non_empty(&config.parent) {
            args.push_pair("-parent", path);
        }

        if config.has_conflicting_type_filter() {
            warn!("Both files_only and folders_only requested; folders_only wins");
        }
        if config.folders_only {
            args.push(FOLDERS_ONLY);
        } else if config.files_only {
            args.push(FILES_ONLY);
        }

        if let Some(attributes) = non_empty(&config.attributes) {
            args.push(format!("{}{}", ATTRIBUTE_PREFIX, attributes));
        }

        if let Some(field) = non_empty(&config.sort_by) {
            let order = if config.sort_ascending {
                "ascending"
            } else {
                "descending"
            };
            args.push_pair("-sort", format!("{}-{}", field, order));
        }

        args.push_if(config.include_name, "-name");
        args.push_if(config.include_path, "-path-column");
        args.push_if(config.include_full_path, "-full-path-and-name");
        args.push_if(config.include_extension, "-extension");
        args.push_if(config.include_size, "-size");
        args.push_if(config.include_date_created, "-date-created");
        args.push_if(config.include_date_modified, "-date-modified");
        args.push_if(config.include_date_accessed, "-date-accessed");
        args.push_if(config.include_attributes, "-attributes");

        args.push(CSV_OUTPUT);
        args.push_pair("-timeout", config.timeout_ms.to_string());

        self.finish(args)
    }

    /// Arguments asking es for its version
    pub fn version(&self) -> ArgumentList {
        let mut args = ArgumentList::new(&self.executable);
        args.push("-version");
        self.finish(args)
    }

    /// Arguments asking es only for the number of matches
    pub fn result_count(&self, query: &str) -> ArgumentList {
        let mut args = ArgumentList::new(&self.executable);
        args.push_pair("-get-result-count", query);
        self.finish(args)
    }

    /// Arguments for an export straight to a file
    pub fn export(&self, request: &ExportRequest) -> ArgumentList {
        let mut args = ArgumentList::new(&self.executable);
        args.push(request.query.as_str());
        args.push_pair(
            &request.format.flag(),
            request.output_file.to_string_lossy().into_owned(),
        );
        args.push_if(request.regex, "-regex");
        args.push_if(request.case_sensitive, "-case");
        if let Some(max_results) = request.max_results.filter(|n| *n > 0) {
            args.push_pair("-max-results", max_results.to_string());
        }
        self.finish(args)
    }

    fn finish(&self, args: ArgumentList) -> ArgumentList {
        if let Some(hook) = &self.hook {
            hook(&args);
        }
        args
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ExportFormat;
    use std::sync::Mutex;

    const ES: &str = "C:/Program Files/Everything/es.exe";

    fn builder() -> ArgumentBuilder {
        ArgumentBuilder::new(ES)
    }

    fn tokens(args: &ArgumentList) -> Vec<&str> {
        args.as_slice().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_default_query() {
        let args = builder().search(&QueryConfig::default());
        assert_eq!(
            tokens(&args),
            vec![ES, "", "-name", "-csv", "-timeout", "5000"]
        );
    }

    #[test]
    fn test_plain_query_follows_executable() {
        let args = builder().search(&QueryConfig::new("marvel").with_case_sensitive(true));
        assert_eq!(args.program(), ES);
        assert_eq!(args.args()[0], "marvel");
        assert!(!args.contains("-regex"));
    }

    #[test]
    fn test_regex_flag_precedes_query() {
        let args = builder().search(&QueryConfig::new(r"^report_\d+\.pdf$").with_regex(true));
        assert_eq!(args.args()[0], "-regex");
        assert_eq!(args.args()[1], r"^report_\d+\.pdf$");
    }

    #[test]
    fn test_full_ordering() {
        let config = QueryConfig {
            query: "q".to_string(),
            regex: false,
            case_sensitive: true,
            whole_words: true,
            match_path: true,
            match_diacritics: true,
            max_results: Some(50),
            offset: 10,
            path_filter: Some("C:\\Users".to_string()),
            parent_path: Some("C:\\Users\\me".to_string()),
            parent: Some("C:\\Temp".to_string()),
            folders_only: false,
            files_only: true,
            attributes: Some("RH".to_string()),
            sort_by: Some("size".to_string()),
            sort_ascending: false,
            include_name: true,
            include_path: true,
            include_full_path: true,
            include_extension: true,
            include_size: true,
            include_date_created: true,
            include_date_modified: true,
            include_date_accessed: true,
            include_attributes: true,
            timeout_ms: 30000,
        };

        let args = builder().search(&config);
        assert_eq!(
            tokens(&args),
            vec![
                ES,
                "q",
                "-case",
                "-whole-words",
                "-match-path",
                "-diacritics",
                "-max-results",
                "50",
                "-offset",
                "10",
                "-path",
                "C:\\Users",
                "-parent-path",
                "C:\\Users\\me",
                "-parent",
                "C:\\Temp",
                "/a-d",
                "/aRH",
                "-sort",
                "size-descending",
                "-name",
                "-path-column",
                "-full-path-and-name",
                "-extension",
                "-size",
                "-date-created",
                "-date-modified",
                "-date-accessed",
                "-attributes",
                "-csv",
                "-timeout",
                "30000",
            ]
        );
    }

    #[test]
    fn test_folders_only_wins() {
        let config = QueryConfig::new("x").files_only().folders_only();
        let args = builder().search(&config);
        assert!(args.contains(FOLDERS_ONLY));
        assert!(!args.contains(FILES_ONLY));
    }

    #[test]
    fn test_zero_offset_and_empty_filters_are_omitted() {
        let config = QueryConfig {
            offset: 0,
            path_filter: Some(String::new()),
            attributes: Some(String::new()),
            sort_by: Some(String::new()),
            ..QueryConfig::new("x")
        };
        let args = builder().search(&config);
        assert!(!args.contains("-offset"));
        assert!(!args.contains("-path"));
        assert!(!args.contains("-sort"));
        assert!(!args.contains(ATTRIBUTE_PREFIX));
    }

    #[test]
    fn test_max_results_zero_is_forwarded() {
        let args = builder().search(&QueryConfig::new("x").with_max_results(0));
        assert_eq!(args.value_of("-max-results"), Some("0"));
    }

    #[test]
    fn test_sort_ascending_suffix() {
        let args = builder().search(&QueryConfig::new("x").with_sort("date-modified", true));
        assert_eq!(args.value_of("-sort"), Some("date-modified-ascending"));
    }

    #[test]
    fn test_timeout_always_last() {
        for config in [
            QueryConfig::default().with_timeout_ms(1),
            QueryConfig::new("a").with_regex(true).with_timeout_ms(777),
            QueryConfig::new("b").folders_only().with_sort("name", false),
        ] {
            let args = builder().search(&config);
            let all = args.as_slice();
            assert_eq!(all[all.len() - 3], CSV_OUTPUT);
            assert_eq!(all[all.len() - 2], "-timeout");
            assert_eq!(all[all.len() - 1], config.timeout_ms.to_string());
        }
    }

    #[test]
    fn test_each_include_flag_adds_one_token() {
        let flags: [(fn(&mut QueryConfig), &str); 9] = [
            (|c| c.include_name = true, "-name"),
            (|c| c.include_path = true, "-path-column"),
            (|c| c.include_full_path = true, "-full-path-and-name"),
            (|c| c.include_extension = true, "-extension"),
            (|c| c.include_size = true, "-size"),
            (|c| c.include_date_created = true, "-date-created"),
            (|c| c.include_date_modified = true, "-date-modified"),
            (|c| c.include_date_accessed = true, "-date-accessed"),
            (|c| c.include_attributes = true, "-attributes"),
        ];

        let base = QueryConfig {
            include_name: false,
            ..QueryConfig::new("x")
        };
        let base_len = builder().search(&base).len();

        for (enable, token) in flags {
            let mut config = base.clone();
            enable(&mut config);
            let args = builder().search(&config);
            assert_eq!(args.len(), base_len + 1, "{}", token);
            assert!(args.contains(token), "{}", token);
        }
    }

    #[test]
    fn test_count_and_version() {
        let b = builder();
        assert_eq!(tokens(&b.version()), vec![ES, "-version"]);
        assert_eq!(
            tokens(&b.result_count("*.txt")),
            vec![ES, "-get-result-count", "*.txt"]
        );
    }

    #[test]
    fn test_export_arguments() {
        let mut request = ExportRequest::new("*.mp3", "/tmp/out.m3u", ExportFormat::M3u);
        request.case_sensitive = true;
        request.max_results = Some(100);

        let args = builder().export(&request);
        assert_eq!(
            tokens(&args),
            vec![
                ES,
                "*.mp3",
                "-export-m3u",
                "/tmp/out.m3u",
                "-case",
                "-max-results",
                "100"
            ]
        );
    }

    #[test]
    fn test_hook_sees_every_list() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let b = builder().with_hook(Arc::new(move |args: &ArgumentList| {
            sink.lock().unwrap().push(args.clone());
        }));

        let search = b.search(&QueryConfig::new("x"));
        let version = b.version();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], search);
        assert_eq!(seen[1], version);
    }

    #[test]
    fn test_display_quotes_tokens() {
        let args = ArgumentBuilder::new("es.exe").result_count("two words");
        assert_eq!(args.to_string(), r#""es.exe" "-get-result-count" "two words""#);
    }
}
