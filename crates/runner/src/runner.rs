//! Build orchestration.
//!
//! [`BuildRunner`] drives one CI build from a resolved [`BuildContext`]:
//!
//! 1. Ensure the output directory exists
//! 2. Derive the child environment (unbuffered output, credentials, project id)
//! 3. Install the test runner
//! 4. Classify the build type and arm log shipping for continuous builds
//! 5. Run the test session, racing it against a hang-up
//! 6. Collect the result log
//! 7. Ship logs (continuous only), exactly once
//!
//! Steps 1 to 3 fail fast. From step 4 on nothing is an error: the test
//! runner's exit code is the result, and collection and shipping are best
//! effort.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use ci_shim_core::build_type::BuildType;
use ci_shim_core::config::{ShimConfig, ToolsConfig};
use ci_shim_core::context::BuildContext;
use ci_shim_core::environment::ChildEnvironment;
use ci_shim_core::error::ShimError;
use ci_shim_core::session::SessionSelector;

use crate::artifacts::{collect_result_log, ensure_output_dir};
use crate::cleanup::{BinaryLogShipper, CleanupGuard, LogShipper};
use crate::install::{install_command, install_test_runner, uninstall_legacy_command, version_command};
use crate::launcher::{CommandSpec, ProcessLauncher};

/// Exit code recorded when a hang-up interrupts the test session (128 + SIGHUP).
pub const HANGUP_EXIT_CODE: i32 = 129;

/// Exit code recorded when the test runner cannot be started at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// `python -m <runner> [-s <session>]`
pub fn test_command(
    tools: &ToolsConfig,
    session: &SessionSelector,
    cwd: &Path,
    env: &ChildEnvironment,
) -> CommandSpec {
    CommandSpec::new(&tools.python)
        .args(["-m", tools.test_runner.as_str()])
        .args(session.runner_args())
        .cwd(cwd)
        .env(env)
}

/// Result of the setup phase.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub env: ChildEnvironment,
    pub output_dir: PathBuf,
}

/// Outcome of a completed build.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub build_type: BuildType,
    pub session: SessionSelector,
    /// Test runner's exit code; the shim exits with this
    pub exit_code: i32,
    /// A hang-up stopped the test session
    pub hung_up: bool,
    pub output_dir: PathBuf,
    /// Collected result log, if any
    pub result_log: Option<PathBuf>,
    /// The log shipper was invoked
    pub logs_shipped: bool,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Commands a build would execute, without running them.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub build_type: BuildType,
    pub project_root: PathBuf,
    pub output_dir: PathBuf,
    pub commands: Vec<String>,
    pub result_log: Option<String>,
    pub log_shipper: Option<PathBuf>,
}

/// Sequences setup, test execution, collection and log shipping.
pub struct BuildRunner<L: ProcessLauncher> {
    config: ShimConfig,
    launcher: L,
}

impl<L: ProcessLauncher> BuildRunner<L> {
    pub fn new(config: ShimConfig, launcher: L) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    /// Run a full build. `hangup` resolving stops the test session.
    ///
    /// # Errors
    ///
    /// Only setup failures are errors: `ShimError::Config` for missing
    /// credentials or project id, `ShimError::Io` for the output directory,
    /// `ShimError::ToolInstall` for the installer. A failing test session
    /// is reported through [`RunReport::exit_code`].
    pub async fn run<F>(&self, ctx: &BuildContext, hangup: F) -> Result<RunReport, ShimError>
    where
        F: Future<Output = ()>,
    {
        log_kokoro_env();
        info!(
            project_root = %ctx.project_root.display(),
            artifacts_dir = ?ctx.artifacts_dir,
            "starting build"
        );

        let prepared = self.prepare(ctx).await?;
        let shipper = Arc::new(BinaryLogShipper::new(
            ctx.gfile(&self.config.tools.log_shipper),
            &ctx.project_root,
            prepared.env.clone(),
        ));

        Ok(self.execute(ctx, &prepared, shipper, hangup).await)
    }

    /// Setup phase: output directory, child environment, tool install.
    pub async fn prepare(&self, ctx: &BuildContext) -> Result<Prepared, ShimError> {
        let output_dir = ctx.output_dir(&self.config.project);
        ensure_output_dir(&output_dir)?;

        let env = ChildEnvironment::derive(ctx)?;
        debug!(vars = env.len(), "child environment derived");

        install_test_runner(&self.launcher, &self.config.tools, &ctx.project_root, &env).await?;

        Ok(Prepared { env, output_dir })
    }

    /// Test phase. Never fails; the outcome is in the report.
    pub async fn execute<F>(
        &self,
        ctx: &BuildContext,
        prepared: &Prepared,
        shipper: Arc<dyn LogShipper>,
        hangup: F,
    ) -> RunReport
    where
        F: Future<Output = ()>,
    {
        let build_type = ctx.build_type();
        info!(
            build_type = %build_type,
            label = %ctx.build_subdir_label,
            "build type classified"
        );

        let mut guard = if build_type.ships_logs() {
            CleanupGuard::armed(shipper)
        } else {
            CleanupGuard::disarmed()
        };

        let spec = test_command(
            &self.config.tools,
            &ctx.session,
            &ctx.project_root,
            &prepared.env,
        );
        info!(command = %spec, session = ctx.session.name().unwrap_or("<all>"), "running test session");

        tokio::pin!(hangup);
        let (exit_code, hung_up) = tokio::select! {
            result = self.launcher.run(&spec) => match result {
                Ok(status) => (status.exit_code(), false),
                Err(e) => {
                    error!(error = %e, "test runner could not be started");
                    (SPAWN_FAILURE_EXIT_CODE, false)
                }
            },
            () = &mut hangup => {
                warn!("hang-up received, stopping test session");
                (HANGUP_EXIT_CODE, true)
            }
        };

        if exit_code == 0 {
            info!("test session passed");
        } else {
            warn!(exit_code, "test session failed");
        }

        let result_log = match build_type.result_log_name() {
            Some(name) => collect_result_log(&ctx.project_root, &prepared.output_dir, name),
            None => {
                debug!("no result log for this build type");
                None
            }
        };

        let logs_shipped = guard.fire_async().await;

        RunReport {
            build_type,
            session: ctx.session.clone(),
            exit_code,
            hung_up,
            output_dir: prepared.output_dir.clone(),
            result_log,
            logs_shipped,
        }
    }

    /// Describe what [`run`](Self::run) would do, without side effects.
    pub fn plan(&self, ctx: &BuildContext) -> BuildPlan {
        let tools = &self.config.tools;
        let cwd = &ctx.project_root;
        let env = ChildEnvironment::new();
        let build_type = ctx.build_type();

        let mut commands = Vec::new();
        if let Some(uninstall) = uninstall_legacy_command(tools, cwd, &env) {
            commands.push(uninstall.to_string());
        }
        commands.push(install_command(tools, cwd, &env).to_string());
        commands.push(version_command(tools, cwd, &env).to_string());
        commands.push(test_command(tools, &ctx.session, cwd, &env).to_string());

        BuildPlan {
            build_type,
            project_root: ctx.project_root.clone(),
            output_dir: ctx.output_dir(&self.config.project),
            commands,
            result_log: build_type.result_log_name().map(str::to_owned),
            log_shipper: build_type
                .ships_logs()
                .then(|| ctx.gfile(&tools.log_shipper)),
        }
    }
}

/// Log every `KOKORO_*` variable, sorted, at debug level.
fn log_kokoro_env() {
    for (key, value) in kokoro_vars(std::env::vars()) {
        debug!(key = %key, value = %value, "ci environment");
    }
}

/// `KOKORO*` entries of `vars`, sorted by name.
fn kokoro_vars<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut selected: Vec<_> = vars
        .into_iter()
        .filter(|(key, _)| key.starts_with("KOKORO"))
        .collect();
    selected.sort();
    selected
}
