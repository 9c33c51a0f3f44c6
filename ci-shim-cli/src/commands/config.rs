//! `ci-shim config` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use ci_shim_core::config::ShimConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
///
/// `loaded` is the outcome of loading the effective configuration from
/// `source`; validation reports its error instead of failing early.
pub fn execute(
    args: ConfigArgs,
    source: &str,
    loaded: Result<ShimConfig, CliError>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(source, loaded, writer),
        ConfigAction::Show => execute_show(source, loaded?, writer),
    }
}

fn execute_validate(
    source: &str,
    loaded: Result<ShimConfig, CliError>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(source, "validating configuration");

    let report = match loaded {
        Ok(_) => ConfigValidationReport {
            source: source.to_owned(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: source.to_owned(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

fn execute_show(source: &str, config: ShimConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let config_toml = toml::to_string_pretty(&config)
        .map_err(|e| CliError::Command(format!("failed to serialize config: {e}")))?;
    writer.render(&ConfigReport {
        source: source.to_owned(),
        config_toml,
    })
}

/// Config validation result.
#[derive(Debug, Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.valid {
            writeln!(w, "Configuration valid: {}", self.source)?;
        } else {
            writeln!(w, "Configuration invalid: {}", self.source)?;
            for err in &self.errors {
                writeln!(w, "  - {err}")?;
            }
        }
        Ok(())
    }
}

/// Effective configuration dump.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub source: String,
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "# source: {}", self.source)?;
        write!(w, "{}", self.config_toml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_report_text_lists_errors() {
        let report = ConfigValidationReport {
            source: "ci-shim.toml".to_owned(),
            valid: false,
            errors: vec!["bad log level".to_owned()],
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("Configuration invalid: ci-shim.toml"));
        assert!(output.contains("- bad log level"));
    }

    #[test]
    fn test_validate_invalid_config_returns_config_error() {
        let writer = OutputWriter::new(crate::cli::OutputFormat::Json);
        let err = execute_validate(
            "bad.toml",
            Err(CliError::Config("parse failed".to_owned())),
            &writer,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_config_report_contains_sections() {
        let config_toml = toml::to_string_pretty(&ShimConfig::default()).expect("serialize");
        let report = ConfigReport {
            source: "(defaults)".to_owned(),
            config_toml,
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("[tools]"));
        assert!(output.contains("flakybot"));
    }
}
