//! Test-runner installation through `python -m pip`.

use std::path::Path;

use tracing::{info, warn};

use ci_shim_core::config::ToolsConfig;
use ci_shim_core::environment::ChildEnvironment;
use ci_shim_core::error::{LaunchError, ToolInstallError};

use crate::launcher::{CommandSpec, ProcessLauncher};

/// `python -m pip uninstall --yes --quiet <legacy>`, or `None` when no
/// legacy package is configured.
pub fn uninstall_legacy_command(
    tools: &ToolsConfig,
    cwd: &Path,
    env: &ChildEnvironment,
) -> Option<CommandSpec> {
    if tools.legacy_package.trim().is_empty() {
        return None;
    }
    Some(
        CommandSpec::new(&tools.python)
            .args(["-m", "pip", "uninstall", "--yes", "--quiet"])
            .arg(&tools.legacy_package)
            .cwd(cwd)
            .env(env),
    )
}

/// `python -m pip install --upgrade --quiet <runner>`
pub fn install_command(tools: &ToolsConfig, cwd: &Path, env: &ChildEnvironment) -> CommandSpec {
    CommandSpec::new(&tools.python)
        .args(["-m", "pip", "install", "--upgrade", "--quiet"])
        .arg(&tools.test_runner)
        .cwd(cwd)
        .env(env)
}

/// `python -m <runner> --version`
pub fn version_command(tools: &ToolsConfig, cwd: &Path, env: &ChildEnvironment) -> CommandSpec {
    CommandSpec::new(&tools.python)
        .args(["-m", tools.test_runner.as_str(), "--version"])
        .cwd(cwd)
        .env(env)
}

/// Remove the legacy package, install or upgrade the runner, then check
/// that it starts.
///
/// # Errors
///
/// - `ToolInstallError::Spawn`: the interpreter could not be started
/// - `ToolInstallError::Failed`: install or version check exited non-zero
pub async fn install_test_runner<L: ProcessLauncher>(
    launcher: &L,
    tools: &ToolsConfig,
    cwd: &Path,
    env: &ChildEnvironment,
) -> Result<(), ToolInstallError> {
    if let Some(uninstall) = uninstall_legacy_command(tools, cwd, env) {
        match launcher.run(&uninstall).await {
            Ok(status) if status.success() => {
                info!(package = %tools.legacy_package, "legacy package removed");
            }
            Ok(status) => warn!(
                package = %tools.legacy_package,
                code = status.exit_code(),
                "legacy package uninstall failed, continuing"
            ),
            Err(e) => warn!(
                package = %tools.legacy_package,
                error = %e,
                "legacy package uninstall could not run, continuing"
            ),
        }
    }

    run_required(launcher, &install_command(tools, cwd, env), "pip install").await?;
    info!(runner = %tools.test_runner, "test runner installed");

    run_required(launcher, &version_command(tools, cwd, env), "version check").await?;

    Ok(())
}

async fn run_required<L: ProcessLauncher>(
    launcher: &L,
    spec: &CommandSpec,
    step: &str,
) -> Result<(), ToolInstallError> {
    let status = launcher.run(spec).await.map_err(|e| match e {
        LaunchError::Spawn { program, reason } | LaunchError::Wait { program, reason } => {
            ToolInstallError::Spawn { program, reason }
        }
    })?;

    if !status.success() {
        return Err(ToolInstallError::Failed {
            step: step.to_owned(),
            code: status.exit_code(),
        });
    }
    Ok(())
}
