//! ci-shim.toml integration tests
//!
//! - ci-shim.toml.example parsing
//! - partial files
//! - env override precedence
//! - empty / malformed file errors

use std::fs;

use ci_shim_core::config::ShimConfig;
use ci_shim_core::error::{ConfigError, ShimError};
use serial_test::serial;
use tempfile::TempDir;

const EXAMPLE: &str = include_str!("../../../ci-shim.toml.example");

// =============================================================================
// ci-shim.toml.example
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = ShimConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.project.default_root, ".");
    assert_eq!(config.project.output_dir, "output");
    assert_eq!(config.tools.python, "python3");
    assert_eq!(config.tools.test_runner, "nox");
    assert_eq!(config.tools.legacy_package, "nox-automation");
    assert_eq!(config.tools.log_shipper, "linux_amd64/flakybot");
}

#[test]
fn example_config_passes_validation() {
    let config = ShimConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

// =============================================================================
// file loading
// =============================================================================

#[tokio::test]
#[serial]
async fn load_partial_file_keeps_defaults() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("ci-shim.toml");
    fs::write(&path, "[tools]\ntest_runner = \"nox-custom\"\n").expect("should write config");

    let config = ShimConfig::load(&path).await.expect("should load");
    assert_eq!(config.tools.test_runner, "nox-custom");
    assert_eq!(config.tools.python, "python3");
}

#[tokio::test]
async fn load_empty_file_uses_defaults() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").expect("should write empty file");

    let config = ShimConfig::from_file(&path).await.expect("empty file is valid");
    assert_eq!(config.project.output_dir, "output");
}

#[tokio::test]
async fn load_malformed_file_fails() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[tools\npython = \"python3\"\n").expect("should write bad config");

    let err = ShimConfig::from_file(&path).await.unwrap_err();
    assert!(matches!(
        err,
        ShimError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[tokio::test]
async fn load_invalid_value_fails_validation() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("bad-level.toml");
    fs::write(&path, "[general]\nlog_level = \"loud\"\n").expect("should write config");

    let err = ShimConfig::from_file(&path).await.unwrap_err();
    assert!(err.to_string().contains("general.log_level"));
}

// =============================================================================
// env overrides
// =============================================================================

#[tokio::test]
#[serial]
async fn env_override_beats_file_value() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("ci-shim.toml");
    fs::write(&path, "[tools]\npython = \"python3.9\"\n").expect("should write config");

    // SAFETY: serialized test, no other thread touches this variable.
    unsafe { std::env::set_var("CI_SHIM_TOOLS_PYTHON", "python3.12") };
    let result = ShimConfig::load(&path).await;
    unsafe { std::env::remove_var("CI_SHIM_TOOLS_PYTHON") };

    let config = result.expect("should load");
    assert_eq!(config.tools.python, "python3.12");
}

#[test]
#[serial]
fn from_env_applies_overrides_to_defaults() {
    // SAFETY: serialized test, no other thread touches this variable.
    unsafe { std::env::set_var("CI_SHIM_PROJECT_OUTPUT_DIR", "results") };
    let result = ShimConfig::from_env();
    unsafe { std::env::remove_var("CI_SHIM_PROJECT_OUTPUT_DIR") };

    let config = result.expect("defaults plus override should validate");
    assert_eq!(config.project.output_dir, "results");
    assert_eq!(config.tools.test_runner, "nox");
}

#[test]
#[serial]
fn from_env_rejects_invalid_override() {
    // SAFETY: serialized test, no other thread touches this variable.
    unsafe { std::env::set_var("CI_SHIM_GENERAL_LOG_FORMAT", "xml") };
    let result = ShimConfig::from_env();
    unsafe { std::env::remove_var("CI_SHIM_GENERAL_LOG_FORMAT") };

    assert!(result.is_err(), "invalid env override should fail validation");
}
