//! Bootstrap configuration loading
//!
//! Resolution order for every setting:
//! 1. Command-line argument / environment variable (handled by the binary's CLI)
//! 2. TOML configuration file
//! 3. Compiled defaults
//!
//! A missing TOML file is not an error; the service starts on defaults.
//! A TOML file that exists but does not parse is.

use crate::{Error, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default HTTP port for formix-an
pub const DEFAULT_PORT: u16 = 5790;

/// Default budget for retrying "database is locked" failures
pub const DEFAULT_LOCK_RETRY_MAX_MS: u64 = 5000;

/// Largest accepted server timezone offset, in minutes (UTC+14:00)
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Path to SQLite database file
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    pub port: u16,

    /// Server timezone as a fixed offset from UTC, in minutes.
    /// Daily analytics rows are keyed by the start of day in this offset.
    pub utc_offset_minutes: i32,

    /// Maximum total time spent retrying a locked counter write
    pub lock_retry_max_ms: u64,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            port: DEFAULT_PORT,
            utc_offset_minutes: 0,
            lock_retry_max_ms: DEFAULT_LOCK_RETRY_MAX_MS,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error or an EnvFilter directive)
    pub level: String,

    /// Log file path (optional, logs to stderr only if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. Returns `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map(Some)
            .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        utc_offset(self.utc_offset_minutes)?;

        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }

        Ok(())
    }
}

/// Overrides supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Fully resolved bootstrap configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config_file: PathBuf,
    /// Whether `config_file` existed and was read
    pub config_file_loaded: bool,
    pub database_path: PathBuf,
    pub port: u16,
    pub utc_offset: FixedOffset,
    pub lock_retry_max_ms: u64,
    pub logging: LoggingConfig,
}

/// Resolve configuration: overrides, then TOML, then compiled defaults
pub fn resolve(overrides: ConfigOverrides) -> Result<ResolvedConfig> {
    let config_file = overrides
        .config_file
        .clone()
        .unwrap_or_else(default_config_file);

    let loaded = TomlConfig::load(&config_file)?;
    let config_file_loaded = loaded.is_some();
    let toml = loaded.unwrap_or_default();

    let database_path = overrides
        .database_path
        .or(toml.database_path)
        .unwrap_or_else(default_database_path);

    let mut logging = toml.logging;
    if let Some(level) = overrides.log_level {
        logging.level = level;
    }

    Ok(ResolvedConfig {
        config_file,
        config_file_loaded,
        database_path,
        port: overrides.port.unwrap_or(toml.port),
        utc_offset: utc_offset(toml.utc_offset_minutes)?,
        lock_retry_max_ms: toml.lock_retry_max_ms,
        logging,
    })
}

/// Convert a minute offset into a chrono offset, rejecting values beyond +/-14h
pub fn utc_offset(minutes: i32) -> Result<FixedOffset> {
    if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return Err(Error::Config(format!(
            "utc_offset_minutes must be within +/-{}, got {}",
            MAX_UTC_OFFSET_MINUTES, minutes
        )));
    }

    FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| Error::Config(format!("Invalid UTC offset: {} minutes", minutes)))
}

/// Platform config file location (~/.config/formix/formix-an.toml on Linux)
pub fn default_config_file() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("formix").join("formix-an.toml"))
        .unwrap_or_else(|| PathBuf::from("formix-an.toml"))
}

/// Platform database location (~/.local/share/formix/formix.db on Linux)
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("formix").join("formix.db"))
        .unwrap_or_else(|| PathBuf::from("./formix_data/formix.db"))
}
