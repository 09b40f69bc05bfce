//! Integration tests for bootstrap config resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate FORENSICS_WORKER_CONFIG are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use forensics_common::config::{load_toml_config, resolve_config, TomlConfig, CONFIG_PATH_ENV};
use forensics_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
host = "127.0.0.1"
port = 9001
max_body_bytes = 1024
max_signals = 10
max_cells = 5000
em_iterations = 120

[logging]
level = "debug"
"#,
    );

    let config = load_toml_config(file.path()).unwrap();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 9001);
    assert_eq!(config.max_body_bytes, 1024);
    assert_eq!(config.max_signals, 10);
    assert_eq!(config.max_cells, 5000);
    assert_eq!(config.em_iterations, 120);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_config_is_error() {
    let file = write_config("port = \"not a number\"\n");
    let result = load_toml_config(file.path());
    assert!(matches!(result, Err(Error::TomlParse(_))));
}

#[test]
fn test_invalid_values_rejected() {
    let file = write_config("max_signals = 0\n");
    let result = load_toml_config(file.path());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_cli_path_takes_priority_over_env() {
    let cli_file = write_config("port = 7001\n");
    let env_file = write_config("port = 7002\n");
    env::set_var(CONFIG_PATH_ENV, env_file.path());

    let config = resolve_config(Some(cli_file.path())).unwrap();
    assert_eq!(config.port, 7001);

    env::remove_var(CONFIG_PATH_ENV);
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    let env_file = write_config("port = 7002\n");
    env::set_var(CONFIG_PATH_ENV, env_file.path());

    let config = resolve_config(None).unwrap();
    assert_eq!(config.port, 7002);

    env::remove_var(CONFIG_PATH_ENV);
}

#[test]
#[serial]
fn test_missing_explicit_file_falls_back_to_defaults() {
    env::remove_var(CONFIG_PATH_ENV);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = resolve_config(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
}
