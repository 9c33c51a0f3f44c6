//! Deferred log shipping for continuous builds.
//!
//! A [`CleanupGuard`] is armed once the build type is known. It fires the
//! shipper exactly once: explicitly through [`CleanupGuard::fire_async`] (or
//! [`CleanupGuard::fire`]), or from `Drop` if the build is abandoned first
//! (early return, cancelled future).
//! Shipper failures are logged and never surface as the build result.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{error, info, warn};

use ci_shim_core::environment::ChildEnvironment;

/// Errors from the log shipper.
#[derive(Debug, thiserror::Error)]
pub enum ShipError {
    /// The shipper binary could not be made executable
    #[error("failed to mark {path} executable: {reason}")]
    Permissions { path: String, reason: String },

    /// The shipper could not be started
    #[error("failed to run {path}: {reason}")]
    Spawn { path: String, reason: String },

    /// The shipper ran and exited non-zero
    #[error("{path} exited with code {code}")]
    Failed { path: String, code: i32 },
}

/// Ships build logs to the flaky-test tracker.
///
/// Synchronous because it has to run from `Drop`.
pub trait LogShipper: Send + Sync + 'static {
    fn ship(&self) -> Result<(), ShipError>;

    /// Human-readable target, for logs and plans.
    fn describe(&self) -> String;
}

/// Runs an external shipper binary with no arguments.
#[derive(Debug, Clone)]
pub struct BinaryLogShipper {
    binary: PathBuf,
    cwd: PathBuf,
    env: ChildEnvironment,
}

impl BinaryLogShipper {
    pub fn new(binary: impl Into<PathBuf>, cwd: impl Into<PathBuf>, env: ChildEnvironment) -> Self {
        Self {
            binary: binary.into(),
            cwd: cwd.into(),
            env,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl LogShipper for BinaryLogShipper {
    fn ship(&self) -> Result<(), ShipError> {
        let path = self.binary.display().to_string();

        make_executable(&self.binary).map_err(|e| ShipError::Permissions {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let status = Command::new(&self.binary)
            .current_dir(&self.cwd)
            .envs(self.env.iter())
            .stdin(Stdio::null())
            .status()
            .map_err(|e| ShipError::Spawn {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(ShipError::Failed {
                path,
                code: status.code().unwrap_or(1),
            });
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.binary.display().to_string()
    }
}

/// `chmod +x`
#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(path: &Path) -> std::io::Result<()> {
    std::fs::metadata(path).map(|_| ())
}

/// Run-once scoped cleanup.
pub struct CleanupGuard {
    shipper: Option<Arc<dyn LogShipper>>,
    fired: bool,
}

impl CleanupGuard {
    /// Guard that will ship logs on release.
    pub fn armed(shipper: Arc<dyn LogShipper>) -> Self {
        info!(shipper = %shipper.describe(), "log shipping registered");
        Self {
            shipper: Some(shipper),
            fired: false,
        }
    }

    /// Guard that does nothing.
    pub fn disarmed() -> Self {
        Self {
            shipper: None,
            fired: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.shipper.is_some()
    }

    /// Mark the guard spent and hand out the shipper, at most once.
    fn take(&mut self) -> Option<Arc<dyn LogShipper>> {
        if self.fired {
            return None;
        }
        self.fired = true;
        self.shipper.clone()
    }

    /// Run the action on the current thread if it has not run yet.
    ///
    /// Returns `true` when the shipper was invoked by this call.
    pub fn fire(&mut self) -> bool {
        let Some(shipper) = self.take() else {
            return false;
        };
        info!(shipper = %shipper.describe(), "shipping build logs");
        log_outcome(shipper.ship());
        true
    }

    /// Like [`fire`](Self::fire), but runs the shipper on the blocking pool
    /// so the runtime's worker stays free.
    pub async fn fire_async(&mut self) -> bool {
        let Some(shipper) = self.take() else {
            return false;
        };
        info!(shipper = %shipper.describe(), "shipping build logs");
        match tokio::task::spawn_blocking(move || shipper.ship()).await {
            Ok(outcome) => log_outcome(outcome),
            Err(e) => error!(error = %e, "log shipping task panicked"),
        }
        true
    }
}

fn log_outcome(outcome: Result<(), ShipError>) {
    match outcome {
        Ok(()) => info!("log shipping finished"),
        Err(e) => error!(error = %e, "log shipping failed"),
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.fired && self.shipper.is_some() {
            warn!("run scope ended before cleanup fired, shipping logs now");
            self.fire();
        }
    }
}
