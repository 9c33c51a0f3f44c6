//! `ci-shim plan` command handler

use ci_shim_core::config::ShimConfig;
use ci_shim_runner::{BuildRunner, SystemLauncher};

use crate::cli::SessionArgs;
use crate::commands::run::resolve_context;
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `plan` command: print what `run` would do.
pub fn execute(
    args: SessionArgs,
    config: ShimConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let ctx = resolve_context(&config, args)?;
    let plan = BuildRunner::new(config, SystemLauncher).plan(&ctx);
    writer.render(&plan)
}
