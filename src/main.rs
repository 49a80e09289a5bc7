//! Everything Search: query the Everything index from the command line, an
//! LLM tool client, or a browser.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use everything_search::{
    config::{self, Settings},
    mcp::{serve_stdio, EverythingTools},
    web::{create_router, AppState},
    EverythingSearch, ExportFormat, ExportRequest, QueryConfig,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to settings.yml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web UI and HTTP API (default)
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Serve tools over MCP on stdin/stdout
    Mcp,
    /// Run one search and print the results as JSON
    Search(SearchArgs),
    /// Print the number of matches for a query
    Count { query: String },
    /// Print the es version
    Version,
    /// Have es write matching results to a file
    Export {
        query: String,
        output: PathBuf,
        /// csv, tsv, txt, m3u or m3u8
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,
        #[arg(long)]
        regex: bool,
        #[arg(long)]
        case: bool,
        #[arg(short = 'n', long)]
        max_results: Option<u32>,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Search text; empty matches everything
    #[arg(default_value = "")]
    query: String,
    #[arg(short, long)]
    regex: bool,
    /// Match case
    #[arg(long)]
    case: bool,
    #[arg(short, long)]
    whole_words: bool,
    #[arg(long)]
    match_path: bool,
    #[arg(long)]
    diacritics: bool,
    #[arg(short = 'n', long)]
    max_results: Option<u32>,
    #[arg(long, default_value_t = 0)]
    offset: u32,
    /// Search within this path
    #[arg(short, long)]
    path: Option<String>,
    #[arg(long)]
    parent_path: Option<String>,
    #[arg(long)]
    parent: Option<String>,
    #[arg(long)]
    files: bool,
    #[arg(long)]
    folders: bool,
    /// DIR-style attribute filter, e.g. "RH"
    #[arg(long)]
    attributes: Option<String>,
    /// Sort field: name, path, size, extension, date-modified, ...
    #[arg(short, long)]
    sort: Option<String>,
    #[arg(long)]
    descending: bool,
    /// Add the full path and name column
    #[arg(long)]
    full_path: bool,
    #[arg(long)]
    size: bool,
    #[arg(long)]
    modified: bool,
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl SearchArgs {
    fn into_config(self, default_timeout_ms: u64) -> QueryConfig {
        QueryConfig {
            query: self.query,
            regex: self.regex,
            case_sensitive: self.case,
            whole_words: self.whole_words,
            match_path: self.match_path,
            match_diacritics: self.diacritics,
            max_results: self.max_results,
            offset: self.offset,
            path_filter: self.path,
            parent_path: self.parent_path,
            parent: self.parent,
            folders_only: self.folders,
            files_only: self.files,
            attributes: self.attributes,
            sort_by: self.sort,
            sort_ascending: !self.descending,
            include_path: !self.full_path,
            include_full_path: self.full_path,
            include_size: self.size,
            include_date_modified: self.modified,
            timeout_ms: self.timeout_ms.unwrap_or(default_timeout_ms),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref(), std::io::stderr)?;

    init_logging(&settings);
    info!(
        "Starting {} v{}",
        settings.general.instance_name,
        everything_search::VERSION
    );

    let search = EverythingSearch::from_settings(&settings.everything)?;
    info!("Using es at {}", search.es_path().display());

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(settings, search, port).await,
        Command::Mcp => serve_stdio(EverythingTools::new(search)).await,
        Command::Search(args) => {
            let config = args.into_config(search.default_timeout_ms());
            let results = search.search(&config).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
        Command::Count { query } => {
            println!("{}", search.result_count(&query).await);
            Ok(())
        }
        Command::Version => {
            println!("{}", search.version().await?);
            Ok(())
        }
        Command::Export {
            query,
            output,
            format,
            regex,
            case,
            max_results,
        } => {
            let mut request = ExportRequest::new(query, output, format);
            request.regex = regex;
            request.case_sensitive = case;
            request.max_results = max_results;
            search.export(&request).await?;
            Ok(())
        }
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Load settings under a temporary subscriber, since the real one depends on them
fn load_settings<W>(path: Option<&Path>, writer: W) -> Result<Settings>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = FmtSubscriber::builder()
        .with_env_filter(env_filter("info"))
        .with_target(false)
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(bootstrap, || config::load(path))
}

/// Log to stderr; stdout belongs to command output and protocol frames
fn init_logging(settings: &Settings) {
    let default = if settings.general.debug { "debug" } else { "info" };

    FmtSubscriber::builder()
        .with_env_filter(env_filter(default))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(settings: Settings, search: EverythingSearch, port: Option<u16>) -> Result<()> {
    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        port.unwrap_or(settings.server.port),
    );

    let state = AppState::new(settings, search)?;
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
