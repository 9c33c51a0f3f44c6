//! Config resolution and command dispatch.

use std::path::{Path, PathBuf};

use ci_shim_core::config::ShimConfig;

use crate::cli::{Cli, Commands, SessionArgs};
use crate::commands;
use crate::error::CliError;
use crate::logging;
use crate::output::OutputWriter;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "ci-shim.toml";

/// Which config file to load, if any, and a label for reports.
pub fn config_source(explicit: Option<&Path>) -> (Option<PathBuf>, String) {
    match explicit {
        Some(path) => (Some(path.to_path_buf()), path.display().to_string()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                let label = default.display().to_string();
                (Some(default), label)
            } else {
                (None, "(defaults)".to_owned())
            }
        }
    }
}

/// Load config (file or defaults, plus env overrides), then apply CLI
/// log overrides and validate again.
pub async fn load_config(
    path: Option<&Path>,
    log_level: Option<&str>,
    log_format: Option<&str>,
) -> Result<ShimConfig, CliError> {
    let mut config = match path {
        Some(path) => ShimConfig::load(path).await?,
        None => ShimConfig::from_env()?,
    };

    if let Some(level) = log_level {
        config.general.log_level = level.to_owned();
    }
    if let Some(format) = log_format {
        config.general.log_format = format.to_owned();
    }
    config.validate()?;

    Ok(config)
}

/// Run the parsed command line. Returns the process exit code.
pub async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let writer = OutputWriter::new(cli.output);
    let (path, source) = config_source(cli.config.as_deref());
    let loaded = load_config(
        path.as_deref(),
        cli.log_level.as_deref(),
        cli.log_format.as_deref(),
    )
    .await;

    let command = match cli.command {
        Some(Commands::Config(args)) => {
            commands::config::execute(args, &source, loaded, &writer)?;
            return Ok(0);
        }
        Some(Commands::Plan(args)) => BuildCommand::Plan(args),
        Some(Commands::Run(args)) => BuildCommand::Run(args),
        None => BuildCommand::Run(SessionArgs::default()),
    };

    let config = loaded?;
    logging::init_tracing(&config.general)
        .map_err(|e| CliError::Command(format!("{e:#}")))?;
    tracing::debug!(source = %source, "configuration loaded");

    match command {
        BuildCommand::Plan(args) => {
            commands::plan::execute(args, config, &writer)?;
            Ok(0)
        }
        BuildCommand::Run(args) => commands::run::execute(args, config, &writer).await,
    }
}

/// Commands that need tracing and a valid config.
enum BuildCommand {
    Run(SessionArgs),
    Plan(SessionArgs),
}
