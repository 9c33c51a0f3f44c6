//! Configuration: `ci-shim.toml` parsing and runtime settings.
//!
//! [`ShimConfig`] is the top-level structure. Every section is optional and
//! falls back to defaults that match a stock Kokoro Python job.
//!
//! # Precedence
//! 1. CLI flags (highest)
//! 2. Environment variables (`CI_SHIM_TOOLS_PYTHON=python3.11` style)
//! 3. Config file (`ci-shim.toml`)
//! 4. Defaults (`Default` impls)
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), ci_shim_core::error::ShimError> {
//! use ci_shim_core::config::ShimConfig;
//!
//! // file + env overrides
//! let config = ShimConfig::load("ci-shim.toml").await?;
//!
//! // straight from a TOML string
//! let config = ShimConfig::parse("[tools]\npython = \"python3.11\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ShimError};

/// Accepted `general.log_level` values.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Accepted `general.log_format` values.
pub const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// ci-shim configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShimConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl ShimConfig {
    /// Load a TOML file, apply env overrides, then validate.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ShimError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus env overrides, for runs without a config file.
    pub fn from_env() -> Result<Self, ShimError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file without env overrides.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ShimError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShimError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ShimError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ShimError> {
        toml::from_str(toml_str).map_err(|e| {
            ShimError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Override values from `CI_SHIM_{SECTION}_{FIELD}` environment variables.
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "CI_SHIM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CI_SHIM_GENERAL_LOG_FORMAT");

        override_string(
            &mut self.project.default_root,
            "CI_SHIM_PROJECT_DEFAULT_ROOT",
        );
        override_string(&mut self.project.output_dir, "CI_SHIM_PROJECT_OUTPUT_DIR");

        override_string(&mut self.tools.python, "CI_SHIM_TOOLS_PYTHON");
        override_string(&mut self.tools.test_runner, "CI_SHIM_TOOLS_TEST_RUNNER");
        override_string(
            &mut self.tools.legacy_package,
            "CI_SHIM_TOOLS_LEGACY_PACKAGE",
        );
        override_string(&mut self.tools.log_shipper, "CI_SHIM_TOOLS_LOG_SHIPPER");
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<(), ShimError> {
        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", LOG_LEVELS.join(", ")),
            }
            .into());
        }

        if !LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", LOG_FORMATS.join(", ")),
            }
            .into());
        }

        if self.project.output_dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "project.output_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        let tools = [
            ("tools.python", &self.tools.python),
            ("tools.test_runner", &self.tools.test_runner),
            ("tools.log_shipper", &self.tools.log_shipper),
        ];
        for (field, value) in tools {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "must not be empty".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// trace, debug, info, warn, error
    pub log_level: String,
    /// json, pretty
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// Project layout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Root used when `PROJECT_ROOT` is unset. Empty means no default.
    pub default_root: String,
    /// Output directory, relative to the project root
    pub output_dir: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            default_root: ".".to_owned(),
            output_dir: "output".to_owned(),
        }
    }
}

/// External tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Interpreter used for `-m pip` and `-m <test_runner>`
    pub python: String,
    /// Test-runner package and module name
    pub test_runner: String,
    /// Package removed before install. Empty skips the uninstall step.
    pub legacy_package: String,
    /// Log-shipping binary, relative to `KOKORO_GFILE_DIR`
    pub log_shipper: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_owned(),
            test_runner: "nox".to_owned(),
            legacy_package: "nox-automation".to_owned(),
            log_shipper: "linux_amd64/flakybot".to_owned(),
        }
    }
}

// --- env override helpers ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}
