//! `ci-shim run` command handler

use tracing::info;

use ci_shim_core::config::ShimConfig;
use ci_shim_core::context::BuildContext;
use ci_shim_core::session::SessionSelector;
use ci_shim_runner::{BuildRunner, SystemLauncher};

use crate::cli::SessionArgs;
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `run` command.
///
/// Returns the test runner's exit code. Setup failures come back as
/// `CliError` and never reach the test runner.
pub async fn execute(
    args: SessionArgs,
    config: ShimConfig,
    writer: &OutputWriter,
) -> Result<i32, CliError> {
    let ctx = resolve_context(&config, args)?;
    info!(
        build_type = %ctx.build_type(),
        session = ctx.session.name().unwrap_or("<all>"),
        "running build"
    );

    let runner = BuildRunner::new(config, SystemLauncher);
    let report = runner.run(&ctx, wait_for_hangup()).await?;

    writer.render(&report)?;
    Ok(report.exit_code)
}

/// Context from the environment, with `--session` taking precedence over
/// `NOX_SESSION`.
pub fn resolve_context(config: &ShimConfig, args: SessionArgs) -> Result<BuildContext, CliError> {
    let ctx = BuildContext::from_env(&config.project)?;
    Ok(match args.session {
        Some(session) => ctx.with_session(SessionSelector::new(Some(&session))),
        None => ctx,
    })
}

/// Resolves when the process receives SIGHUP.
///
/// If the handler cannot be installed the build runs without hang-up
/// handling.
#[cfg(unix)]
async fn wait_for_hangup() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::hangup()) {
        Ok(mut sighup) => {
            sighup.recv().await;
            info!(signal = "SIGHUP", "hang-up signal received");
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to install SIGHUP handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_hangup() {
    std::future::pending::<()>().await;
}
