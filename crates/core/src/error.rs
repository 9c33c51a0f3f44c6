//! Error types shared by every ci-shim crate.

/// Top-level ci-shim error.
///
/// A test run that exits non-zero is not an error; it is reported through
/// the run's exit code instead.
#[derive(Debug, thiserror::Error)]
pub enum ShimError {
    /// Missing or unreadable configuration input
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Test-runner installation failed
    #[error("tool install error: {0}")]
    ToolInstall(#[from] ToolInstallError),

    /// A child process could not be started or awaited
    #[error("launch error: {0}")]
    Launch(#[from] LaunchError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and environment errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is unset or empty
    #[error("required environment variable {name} is not set")]
    MissingVar { name: String },

    /// A required file does not exist
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// A required file exists but could not be read
    #[error("failed to read {path}: {reason}")]
    Unreadable { path: String, reason: String },

    /// Config file could not be parsed
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// Config value is out of range or malformed
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors raised while installing the test runner.
#[derive(Debug, thiserror::Error)]
pub enum ToolInstallError {
    /// The installer could not be spawned at all
    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// The installer ran and exited non-zero
    #[error("{step} exited with code {code}")]
    Failed { step: String, code: i32 },
}

/// Errors raised by a process launcher.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The program could not be spawned
    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// Waiting on the child failed
    #[error("failed to wait on {program}: {reason}")]
    Wait { program: String, reason: String },
}

impl ShimError {
    /// Short machine-friendly category name, used in structured output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::ToolInstall(_) => "tool_install",
            Self::Launch(_) => "launch",
            Self::Io(_) => "io",
        }
    }
}
