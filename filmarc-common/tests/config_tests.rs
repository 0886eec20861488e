//! Tests for config file resolution
//!
//! Uses serial_test to prevent ENV variable race conditions: tests that
//! manipulate FILMARC_CONFIG are marked with #[serial].

use filmarc_common::config::{read_config_file, resolve_config_path, CONFIG_ENV_VAR};
use filmarc_common::ErrorKind;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_argument_wins_over_env() {
    let dir = TempDir::new().unwrap();
    let cli_path = dir.path().join("cli.toml");
    let env_path = dir.path().join("env.toml");
    fs::write(&cli_path, "").unwrap();
    fs::write(&env_path, "").unwrap();

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let resolved = resolve_config_path(Some(&cli_path)).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(cli_path));
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    let dir = TempDir::new().unwrap();
    let env_path = dir.path().join("env.toml");
    fs::write(&env_path, "[analysis]\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let resolved = resolve_config_path(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(env_path));
}

#[test]
#[serial]
fn test_missing_explicit_file_is_config_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = resolve_config_path(Some(&missing)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
#[serial]
fn test_missing_env_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    env::set_var(CONFIG_ENV_VAR, dir.path().join("absent.toml"));
    let result = resolve_config_path(None);
    env::remove_var(CONFIG_ENV_VAR);

    assert!(result.is_err());
}

#[test]
fn test_read_config_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

    let content = read_config_file(&path).unwrap();
    assert!(content.contains("level = \"debug\""));
}
