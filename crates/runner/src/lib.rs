//! ci-shim build runner.
//!
//! Installs the test runner, executes a test session, collects the result
//! log and ships logs for continuous builds. See [`runner::BuildRunner`].

pub mod artifacts;
pub mod cleanup;
pub mod install;
pub mod launcher;
pub mod runner;

pub use cleanup::{BinaryLogShipper, CleanupGuard, LogShipper, ShipError};
pub use launcher::{CommandSpec, ProcessLauncher, ProcessStatus, SystemLauncher};
pub use runner::{BuildPlan, BuildRunner, HANGUP_EXIT_CODE, Prepared, RunReport};
