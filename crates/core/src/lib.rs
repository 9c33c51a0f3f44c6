//! Shared types for ci-shim: build context, build-type classification,
//! session selection, child environment, configuration and errors.

pub mod build_type;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod session;

pub use build_type::{BuildType, RESULT_LOG_NAME};
pub use config::ShimConfig;
pub use context::BuildContext;
pub use environment::ChildEnvironment;
pub use error::{ConfigError, LaunchError, ShimError, ToolInstallError};
pub use session::SessionSelector;
