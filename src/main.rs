use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use song_catalog_server::config::{load_env_file, AppConfig, CliConfig, FileConfig, RunMode};
use song_catalog_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use song_catalog_server::{MetadataLookupClient, SongAccess, SqliteRecordStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().context("Error resolving current directory")?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[clap(about = "Song catalog HTTP server")]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite song database file. Created if missing.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Deployment mode, selects the default log level.
    #[clap(long, env = "MODE", value_enum, default_value = "local")]
    pub mode: RunMode,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Base URL of the song metadata service. Defaults to http://localhost.
    #[clap(long, env = "URL")]
    pub lookup_url: Option<String>,

    /// Timeout in seconds for metadata service requests.
    #[clap(long, default_value_t = 10)]
    pub lookup_timeout_sec: u64,

    /// Deadline in milliseconds for each database call.
    #[clap(long, default_value_t = 3000)]
    pub call_timeout_ms: u64,

    /// Number of read-only database connections.
    #[clap(long, default_value_t = 4)]
    pub read_pool_size: usize,

    /// Allow cross-origin requests from any origin.
    #[clap(long)]
    pub cors_allow_any_origin: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            port: self.port,
            mode: self.mode,
            logging_level: self.logging_level.clone(),
            lookup_url: self.lookup_url.clone(),
            lookup_timeout_sec: self.lookup_timeout_sec,
            call_timeout_ms: self.call_timeout_ms,
            read_pool_size: self.read_pool_size,
            cors_allow_any_origin: self.cors_allow_any_origin,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is not up yet, so report on stderr.
    if load_env_file(Path::new(".env"))? {
        eprintln!("Loaded environment from .env");
    }
    let cli_args = CliArgs::parse();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(config.mode.default_log_level().into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    info!("Opening SQLite song database at {:?}...", config.db_path);
    let store = SqliteRecordStore::new(&config.db_path, config.read_pool_size)?;

    info!("Metadata service configured at {}", config.lookup_url);
    let lookup = MetadataLookupClient::new(config.lookup_url.clone(), config.lookup_timeout_sec)?;

    let songs = SongAccess::new(Arc::new(store), Arc::new(lookup), config.call_timeout);

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        cors_allow_any_origin: config.cors_allow_any_origin,
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(server_config, songs).await
}
