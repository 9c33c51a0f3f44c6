//! Child-process launching abstraction.
//!
//! [`ProcessLauncher`] is the seam between the runner and the operating
//! system. Production code uses [`SystemLauncher`]; tests use
//! [`MockLauncher`] with scripted exit codes.
//!
//! ```text
//!            BuildRunner
//!                 │
//!          ProcessLauncher
//!           ┌─────┴─────┐
//!     SystemLauncher  MockLauncher
//! ```

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use serde::Serialize;
use tracing::debug;

use ci_shim_core::environment::ChildEnvironment;
use ci_shim_core::error::LaunchError;

/// A fully described command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; `None` inherits the shim's.
    pub cwd: Option<PathBuf>,
    /// Added on top of the inherited environment.
    pub env: ChildEnvironment,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: ChildEnvironment::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, env: &ChildEnvironment) -> Self {
        self.env = env.clone();
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How a child process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessStatus {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Terminating signal, if it was killed
    pub signal: Option<i32>,
}

impl ProcessStatus {
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn killed(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Shell-style exit code: the code itself, or `128 + signal`.
    pub fn exit_code(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }
}

impl From<ExitStatus> for ProcessStatus {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

/// Runs a command to completion.
pub trait ProcessLauncher: Send + Sync + 'static {
    /// Spawn `spec` and wait for it to finish.
    ///
    /// Dropping the returned future before it resolves must kill the child.
    ///
    /// # Errors
    ///
    /// - `LaunchError::Spawn`: the program could not be started
    /// - `LaunchError::Wait`: waiting on the child failed
    fn run(
        &self,
        spec: &CommandSpec,
    ) -> impl Future<Output = Result<ProcessStatus, LaunchError>> + Send;
}

/// [`ProcessLauncher`] backed by `tokio::process`, with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessStatus, LaunchError> {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        debug!(command = %spec, "spawning child process");

        let mut child = cmd.spawn().map_err(|e| LaunchError::Spawn {
            program: spec.program.clone(),
            reason: e.to_string(),
        })?;
        let status = child.wait().await.map_err(|e| LaunchError::Wait {
            program: spec.program.clone(),
            reason: e.to_string(),
        })?;

        Ok(status.into())
    }
}

/// Test launcher: records every command and answers from a script.
///
/// Commands whose rendered form contains a scripted pattern get that
/// pattern's status; everything else exits 0.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockLauncher {
    calls: std::sync::Mutex<Vec<CommandSpec>>,
    script: Vec<(String, Result<ProcessStatus, String>)>,
    hang_on: Option<String>,
}

#[cfg(test)]
impl MockLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `pattern` exit with `code`.
    pub fn with_exit(mut self, pattern: &str, code: i32) -> Self {
        self.script
            .push((pattern.to_owned(), Ok(ProcessStatus::exited(code))));
        self
    }

    /// Commands containing `pattern` fail to spawn.
    pub fn with_spawn_failure(mut self, pattern: &str) -> Self {
        self.script
            .push((pattern.to_owned(), Err("no such file or directory".to_owned())));
        self
    }

    /// Commands containing `pattern` never finish.
    pub fn with_hang(mut self, pattern: &str) -> Self {
        self.hang_on = Some(pattern.to_owned());
        self
    }

    /// Every command launched so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl ProcessLauncher for MockLauncher {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessStatus, LaunchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }
        let rendered = spec.to_string();

        if let Some(pattern) = &self.hang_on {
            if rendered.contains(pattern.as_str()) {
                std::future::pending::<()>().await;
            }
        }

        for (pattern, outcome) in &self.script {
            if rendered.contains(pattern.as_str()) {
                return outcome.clone().map_err(|reason| LaunchError::Spawn {
                    program: spec.program.clone(),
                    reason,
                });
            }
        }
        Ok(ProcessStatus::exited(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_spec_display_joins_args() {
        let spec = CommandSpec::new("python3").args(["-m", "nox", "-s", "lint"]);
        assert_eq!(spec.to_string(), "python3 -m nox -s lint");
    }

    #[test]
    fn signal_maps_to_128_plus_n() {
        assert_eq!(ProcessStatus::killed(1).exit_code(), 129);
        assert_eq!(ProcessStatus::killed(9).exit_code(), 137);
        assert!(!ProcessStatus::killed(15).success());
    }

    #[test]
    fn exit_code_passes_through() {
        assert_eq!(ProcessStatus::exited(0).exit_code(), 0);
        assert_eq!(ProcessStatus::exited(3).exit_code(), 3);
        assert!(ProcessStatus::exited(0).success());
    }

    #[tokio::test]
    async fn mock_launcher_records_calls_and_scripts_codes() {
        let launcher = MockLauncher::new().with_exit("install", 2);
        let ok = launcher
            .run(&CommandSpec::new("python3").args(["-m", "nox"]))
            .await
            .unwrap();
        let failed = launcher
            .run(&CommandSpec::new("python3").args(["-m", "pip", "install"]))
            .await
            .unwrap();

        assert!(ok.success());
        assert_eq!(failed.exit_code(), 2);
        assert_eq!(launcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn mock_launcher_spawn_failure() {
        let launcher = MockLauncher::new().with_spawn_failure("pip");
        let err = launcher
            .run(&CommandSpec::new("python3").args(["-m", "pip"]))
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_launcher_reports_exit_code_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = ChildEnvironment::new();
        env.set("CI_SHIM_TEST_VALUE", "42");
        let spec = CommandSpec::new("/bin/sh")
            .args(["-c", "printf %s \"$CI_SHIM_TEST_VALUE\" > seen; exit 7"])
            .cwd(dir.path())
            .env(&env);

        let status = SystemLauncher.run(&spec).await.unwrap();

        assert_eq!(status.exit_code(), 7);
        let seen = std::fs::read_to_string(dir.path().join("seen")).unwrap();
        assert_eq!(seen, "42");
    }

    #[tokio::test]
    async fn system_launcher_spawn_failure() {
        let spec = CommandSpec::new("/nonexistent/ci-shim/binary");
        let err = SystemLauncher.run(&spec).await.unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }
}
