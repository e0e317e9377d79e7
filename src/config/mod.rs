mod file_config;

pub use file_config::FileConfig;

use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

pub const HISTORY_FILE_NAME: &str = ".betterboxd_history";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LoggingLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LoggingLevel> for LevelFilter {
    fn from(level: LoggingLevel) -> Self {
        match level {
            LoggingLevel::Trace => LevelFilter::TRACE,
            LoggingLevel::Debug => LevelFilter::DEBUG,
            LoggingLevel::Info => LevelFilter::INFO,
            LoggingLevel::Warn => LevelFilter::WARN,
            LoggingLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// CLI arguments that can be overridden by the TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub logging_level: Option<LoggingLevel>,
    pub history_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub logging_level: LoggingLevel,
    pub history_path: PathBuf,
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

        let db_dir = match db_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !db_dir.is_dir() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }

        let logging_level = match file.logging_level {
            Some(level) => parse_logging_level(&level)
                .ok_or_else(|| anyhow!("Unknown logging level in config file: {}", level))?,
            None => cli.logging_level.unwrap_or_default(),
        };

        let history_path = file
            .history_path
            .map(PathBuf::from)
            .or_else(|| cli.history_path.clone())
            .unwrap_or_else(|| default_history_path(&db_dir));

        Ok(Self {
            db_path,
            logging_level,
            history_path,
        })
    }
}

fn default_history_path(db_dir: &Path) -> PathBuf {
    db_dir.join(HISTORY_FILE_NAME)
}

/// Parses a logging level string, case-insensitively.
pub fn parse_logging_level(s: &str) -> Option<LoggingLevel> {
    LoggingLevel::from_str(s.trim(), true).ok()
}
