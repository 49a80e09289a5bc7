//! The es handle: builds arguments, runs es, parses what comes back

use super::args::{log_arguments, ArgsHook, ArgumentBuilder, ArgumentList};
use super::error::SearchError;
use super::models::{ExportRequest, QueryConfig};
use super::runner::{CommandRunner, ProcessOutput, ProcessRunner};
use crate::config::EverythingSettings;
use crate::results::{parse_csv, ResultSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Handle to one es executable
///
/// Construct once at startup and hand clones to whoever needs to search.
#[derive(Clone)]
pub struct EverythingSearch {
    builder: ArgumentBuilder,
    runner: Arc<dyn CommandRunner>,
    /// Added to the forwarded timeout to get the host-level deadline
    timeout_grace: Duration,
    /// Deadline base for operations that carry no timeout of their own
    default_timeout_ms: u64,
}

impl EverythingSearch {
    /// Create a handle for the es executable at `es_path`
    pub fn new(es_path: impl Into<PathBuf>) -> Result<Self, SearchError> {
        Self::with_runner(es_path, Arc::new(ProcessRunner))
    }

    /// Create a handle that runs commands through `runner`
    pub fn with_runner(
        es_path: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, SearchError> {
        let es_path = es_path.into();
        if !es_path.exists() {
            return Err(SearchError::ExecutableNotFound(es_path));
        }

        Ok(Self {
            builder: ArgumentBuilder::new(es_path),
            runner,
            timeout_grace: Duration::from_secs(5),
            default_timeout_ms: crate::DEFAULT_TIMEOUT_MS,
        })
    }

    /// Create a handle from the `everything` settings section
    pub fn from_settings(settings: &EverythingSettings) -> Result<Self, SearchError> {
        let mut search = Self::new(&settings.es_path)?
            .with_timeout_grace(Duration::from_millis(settings.timeout_grace_ms))
            .with_default_timeout_ms(settings.default_timeout_ms);
        if settings.log_arguments {
            search = search.with_hook(log_arguments());
        }
        Ok(search)
    }

    /// Observe every argument list before it runs
    pub fn with_hook(mut self, hook: ArgsHook) -> Self {
        self.builder = self.builder.with_hook(hook);
        self
    }

    pub fn with_timeout_grace(mut self, grace: Duration) -> Self {
        self.timeout_grace = grace;
        self
    }

    pub fn with_default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    pub fn es_path(&self) -> &std::path::Path {
        self.builder.executable()
    }

    pub fn default_timeout_ms(&self) -> u64 {
        self.default_timeout_ms
    }

    fn deadline(&self, timeout_ms: u64) -> Duration {
        Duration::from_millis(timeout_ms) + self.timeout_grace
    }

    /// Run a search and parse its output
    pub async fn search(&self, config: &QueryConfig) -> Result<ResultSet, SearchError> {
        let args = self.builder.search(config);
        let start = Instant::now();

        let stdout = self
            .run_with_timeout(&args, config.timeout_ms)
            .await?
            .into_result()?;

        let results = parse_csv(&stdout);
        info!(
            "Search '{}' returned {} results in {:?}",
            config.query,
            results.len(),
            start.elapsed()
        );
        Ok(results)
    }

    /// Search for files only
    pub async fn search_files(&self, config: QueryConfig) -> Result<ResultSet, SearchError> {
        self.search(&config.files_only()).await
    }

    /// Search for folders only
    pub async fn search_folders(&self, config: QueryConfig) -> Result<ResultSet, SearchError> {
        self.search(&config.folders_only()).await
    }

    /// Search for files with an extension, e.g. "py"
    pub async fn search_by_extension(
        &self,
        extension: &str,
        config: QueryConfig,
    ) -> Result<ResultSet, SearchError> {
        let config = config.with_query(format!("ext:{}", extension)).files_only();
        self.search(&config).await
    }

    /// Search for files by size, e.g. ">1MB", "<100KB", "1GB..2GB"
    pub async fn search_by_size(
        &self,
        size_filter: &str,
        mut config: QueryConfig,
    ) -> Result<ResultSet, SearchError> {
        config.include_size = true;
        let config = config.with_query(format!("size:{}", size_filter)).files_only();
        self.search(&config).await
    }

    /// Search for entries modified in the last `days` days
    pub async fn search_recent(
        &self,
        days: u32,
        mut config: QueryConfig,
    ) -> Result<ResultSet, SearchError> {
        config.include_date_modified = true;
        let config = config.with_query(format!("datemodified:last{}days", days));
        self.search(&config).await
    }

    /// The es version string
    pub async fn version(&self) -> Result<String, SearchError> {
        let args = self.builder.version();
        let stdout = self.run(&args).await?.into_result()?;
        Ok(stdout.trim().to_string())
    }

    /// Number of matches for `query`; 0 on any failure
    pub async fn result_count(&self, query: &str) -> u64 {
        let args = self.builder.result_count(query);
        let output = match self.run(&args).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Result count for '{}' failed: {}", query, e);
                return 0;
            }
        };

        if !output.success {
            warn!(
                "Result count for '{}' exited with {:?}: {}",
                query,
                output.code,
                output.stderr.trim()
            );
            return 0;
        }

        output.stdout.trim().parse().unwrap_or_else(|_| {
            debug!("Unparsable result count: {:?}", output.stdout);
            0
        })
    }

    /// Have es write matching results to a file
    pub async fn export(&self, request: &ExportRequest) -> Result<(), SearchError> {
        let args = self.builder.export(request);
        self.run(&args).await?.into_result()?;
        info!(
            "Exported '{}' as {} to {}",
            request.query,
            request.format,
            request.output_file.display()
        );
        Ok(())
    }

    async fn run(&self, args: &ArgumentList) -> Result<ProcessOutput, SearchError> {
        self.run_with_timeout(args, self.default_timeout_ms).await
    }

    /// Run under the host deadline; a timeout reports the caller's `timeout_ms`
    async fn run_with_timeout(
        &self,
        args: &ArgumentList,
        timeout_ms: u64,
    ) -> Result<ProcessOutput, SearchError> {
        match self.runner.run(args, self.deadline(timeout_ms)).await {
            Err(SearchError::Timeout { .. }) => Err(SearchError::Timeout { timeout_ms }),
            other => other,
        }
    }
}
