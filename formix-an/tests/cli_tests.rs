//! Command-line and environment precedence tests
//!
//! Environment variables are process-wide, so these tests run serially.

use clap::Parser;
use formix_an::cli::Args;
use formix_common::config::{self, DEFAULT_PORT};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var("FORMIX_DATABASE");
    env::remove_var("FORMIX_PORT");
    env::remove_var("FORMIX_CONFIG");
}

#[test]
#[serial]
fn test_flags_parse() {
    clear_env();
    let args = Args::try_parse_from([
        "formix-an",
        "--database",
        "/tmp/a.db",
        "--port",
        "6001",
        "--log-level",
        "debug",
    ])
    .unwrap();

    assert_eq!(args.database, Some(PathBuf::from("/tmp/a.db")));
    assert_eq!(args.port, Some(6001));
    assert_eq!(args.log_level.as_deref(), Some("debug"));
    assert_eq!(args.config, None);
}

#[test]
#[serial]
fn test_env_used_when_flag_absent() {
    clear_env();
    env::set_var("FORMIX_PORT", "6100");
    env::set_var("FORMIX_DATABASE", "/tmp/env.db");

    let args = Args::try_parse_from(["formix-an"]).unwrap();
    clear_env();

    assert_eq!(args.port, Some(6100));
    assert_eq!(args.database, Some(PathBuf::from("/tmp/env.db")));
}

#[test]
#[serial]
fn test_flag_beats_env() {
    clear_env();
    env::set_var("FORMIX_PORT", "6100");

    let args = Args::try_parse_from(["formix-an", "--port", "6200"]).unwrap();
    clear_env();

    assert_eq!(args.port, Some(6200));
}

#[test]
#[serial]
fn test_invalid_port_rejected() {
    clear_env();
    assert!(Args::try_parse_from(["formix-an", "--port", "not-a-port"]).is_err());
}

#[test]
#[serial]
fn test_overrides_beat_toml_which_beats_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("formix-an.toml");
    fs::write(
        &config_path,
        r#"
database_path = "/from/toml.db"
port = 7000
utc_offset_minutes = 120

[logging]
level = "warn"
"#,
    )
    .unwrap();

    let args = Args::try_parse_from([
        "formix-an",
        "--config",
        config_path.to_str().unwrap(),
        "--port",
        "7100",
    ])
    .unwrap();
    let resolved = config::resolve(args.into_overrides()).unwrap();

    assert!(resolved.config_file_loaded);
    assert_eq!(resolved.port, 7100);
    assert_eq!(resolved.database_path, PathBuf::from("/from/toml.db"));
    assert_eq!(resolved.utc_offset.local_minus_utc(), 7200);
    assert_eq!(resolved.logging.level, "warn");
}

#[test]
#[serial]
fn test_missing_config_file_falls_back_to_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let args = Args::try_parse_from(["formix-an", "--config", missing.to_str().unwrap()]).unwrap();
    let resolved = config::resolve(args.into_overrides()).unwrap();

    assert!(!resolved.config_file_loaded);
    assert_eq!(resolved.port, DEFAULT_PORT);
    assert_eq!(resolved.database_path, config::default_database_path());
}
