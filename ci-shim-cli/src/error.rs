//! CLI-specific error types and exit code mapping

use ci_shim_core::error::ShimError;

/// CLI-specific error type.
///
/// A failing test session is not a `CliError`: its exit code is passed
/// through unchanged. These errors cover everything that stops the build
/// before the test runner starts.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration or CI environment problem.
    #[error("configuration error: {0}")]
    Config(String),

    /// Test-runner installation failed.
    #[error("tool install error: {0}")]
    ToolInstall(String),

    /// Any other command failure.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (output directory, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                     |
    /// |------|-----------------------------|
    /// | 1    | General / command error     |
    /// | 2    | Configuration error         |
    /// | 3    | Test-runner install failed  |
    /// | 10   | IO error                    |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::ToolInstall(_) => 3,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<ShimError> for CliError {
    fn from(e: ShimError) -> Self {
        match e {
            ShimError::Config(inner) => Self::Config(inner.to_string()),
            ShimError::ToolInstall(inner) => Self::ToolInstall(inner.to_string()),
            ShimError::Io(inner) => Self::Io(inner),
            ShimError::Launch(inner) => Self::Command(inner.to_string()),
        }
    }
}

impl From<ci_shim_core::error::ConfigError> for CliError {
    fn from(e: ci_shim_core::error::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
