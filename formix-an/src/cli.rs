//! Command-line arguments
//!
//! Flags win over their environment variables, which win over the TOML
//! file, which wins over compiled defaults.

use clap::Parser;
use formix_common::config::ConfigOverrides;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "formix-an")]
#[command(about = "Response analytics and field report service")]
#[command(version)]
pub struct Args {
    /// SQLite database file
    #[arg(short, long, env = "FORMIX_DATABASE")]
    pub database: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "FORMIX_PORT")]
    pub port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long, env = "FORMIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG still overrides
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    pub fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config,
            database_path: self.database,
            port: self.port,
            log_level: self.log_level,
        }
    }
}
