mod file_config;

pub use file_config::{FileConfig, LookupConfig, StoreConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Deployment mode, only used to pick the default log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RunMode {
    #[default]
    Local,
    Dev,
    Prod,
}

impl RunMode {
    pub fn default_log_level(&self) -> LevelFilter {
        match self {
            RunMode::Local => LevelFilter::DEBUG,
            RunMode::Dev => LevelFilter::INFO,
            RunMode::Prod => LevelFilter::WARN,
        }
    }
}

/// Metadata service used when none is configured.
pub const DEFAULT_LOOKUP_URL: &str = "http://localhost";

/// Loads `KEY=value` pairs from an env file into the process environment so
/// that env-backed CLI arguments (`PORT`, `MODE`, `URL`) can pick them up.
/// Variables that are already set are left alone. Returns `false` when the
/// file does not exist.
pub fn load_env_file(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(err) if err.not_found() => Ok(false),
        Err(err) => Err(err).with_context(|| format!("Failed to load env file {:?}", path)),
    }
}

/// CLI arguments that can be used for config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub mode: RunMode,
    pub logging_level: RequestsLoggingLevel,
    pub lookup_url: Option<String>,
    pub lookup_timeout_sec: u64,
    pub call_timeout_ms: u64,
    pub read_pool_size: usize,
    pub cors_allow_any_origin: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub mode: RunMode,
    pub logging_level: RequestsLoggingLevel,
    pub cors_allow_any_origin: bool,

    pub lookup_url: String,
    pub lookup_timeout_sec: u64,

    pub call_timeout: Duration,
    pub read_pool_size: usize,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| anyhow!("db_path must be specified via --db-path or in config file"))?;

        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let port = file.port.unwrap_or(cli.port);

        let mode = file
            .mode
            .and_then(|s| RunMode::from_str(&s, true).ok())
            .unwrap_or(cli.mode);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let cors_allow_any_origin = file
            .cors_allow_any_origin
            .unwrap_or(cli.cors_allow_any_origin);

        let lookup_file = file.lookup.unwrap_or_default();
        let lookup_url = lookup_file
            .url
            .or_else(|| cli.lookup_url.clone())
            .unwrap_or_else(|| DEFAULT_LOOKUP_URL.to_string());
        let lookup_timeout_sec = lookup_file.timeout_sec.unwrap_or(cli.lookup_timeout_sec);

        let store_file = file.store.unwrap_or_default();
        let call_timeout_ms = store_file.call_timeout_ms.unwrap_or(cli.call_timeout_ms);
        if call_timeout_ms == 0 {
            bail!("call_timeout_ms must be greater than zero");
        }
        let read_pool_size = store_file.read_pool_size.unwrap_or(cli.read_pool_size);
        if read_pool_size == 0 {
            bail!("read_pool_size must be greater than zero");
        }

        Ok(Self {
            db_path,
            port,
            mode,
            logging_level,
            cors_allow_any_origin,
            lookup_url,
            lookup_timeout_sec,
            call_timeout: Duration::from_millis(call_timeout_ms),
            read_pool_size,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
