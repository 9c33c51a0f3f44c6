//! Build context: everything the runner reads from the CI environment.
//!
//! The context is resolved once, before any tool runs, and is read-only
//! afterwards. Values come through a lookup function so tests can feed a
//! plain map instead of mutating the process environment.
//!
//! Directories are made absolute against the shim's working directory.
//! Children run from the project root, so a relative path handed to them
//! would point somewhere else.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::build_type::BuildType;
use crate::config::ProjectConfig;
use crate::error::ConfigError;
use crate::session::SessionSelector;

pub const ENV_PROJECT_ROOT: &str = "PROJECT_ROOT";
pub const ENV_ARTIFACTS_DIR: &str = "KOKORO_ARTIFACTS_DIR";
pub const ENV_GFILE_DIR: &str = "KOKORO_GFILE_DIR";
pub const ENV_BUILD_SUBDIR: &str = "KOKORO_BUILD_ARTIFACTS_SUBDIR";
pub const ENV_SESSION: &str = "NOX_SESSION";

/// Resolved CI build inputs.
#[derive(Debug, Clone, Serialize)]
pub struct BuildContext {
    /// Working directory for every child process
    pub project_root: PathBuf,
    /// Kokoro artifacts directory, informational
    pub artifacts_dir: Option<PathBuf>,
    /// Directory holding credentials and the log shipper
    pub gfile_dir: PathBuf,
    /// Free-form trigger label
    pub build_subdir_label: String,
    pub session: SessionSelector,
}

impl BuildContext {
    /// Resolve from the process environment.
    pub fn from_env(project: &ProjectConfig) -> Result<Self, ConfigError> {
        Self::from_lookup(project, |key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable lookup.
    ///
    /// Empty values count as unset. Relative directories are resolved
    /// against the current working directory.
    pub fn from_lookup<F>(project: &ProjectConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let root = get(ENV_PROJECT_ROOT)
            .or_else(|| Some(project.default_root.clone()).filter(|r| !r.is_empty()))
            .ok_or_else(|| ConfigError::MissingVar {
                name: ENV_PROJECT_ROOT.to_owned(),
            })?;
        let project_root = absolute(ENV_PROJECT_ROOT, &root)?;
        if !project_root.is_dir() {
            return Err(ConfigError::InvalidValue {
                field: ENV_PROJECT_ROOT.to_owned(),
                reason: format!("{} is not a directory", project_root.display()),
            });
        }

        let gfile_dir = get(ENV_GFILE_DIR).ok_or_else(|| ConfigError::MissingVar {
            name: ENV_GFILE_DIR.to_owned(),
        })?;
        let gfile_dir = absolute(ENV_GFILE_DIR, &gfile_dir)?;

        let artifacts_dir = get(ENV_ARTIFACTS_DIR)
            .map(|dir| absolute(ENV_ARTIFACTS_DIR, &dir))
            .transpose()?;

        let context = Self {
            project_root,
            artifacts_dir,
            gfile_dir,
            build_subdir_label: get(ENV_BUILD_SUBDIR).unwrap_or_default(),
            session: SessionSelector::new(get(ENV_SESSION).as_deref()),
        };

        debug!(
            project_root = %context.project_root.display(),
            gfile_dir = %context.gfile_dir.display(),
            label = %context.build_subdir_label,
            session = context.session.name().unwrap_or("<all>"),
            "build context resolved"
        );

        Ok(context)
    }

    /// Replace the session selector, e.g. from a CLI flag.
    pub fn with_session(mut self, session: SessionSelector) -> Self {
        self.session = session;
        self
    }

    pub fn build_type(&self) -> BuildType {
        BuildType::classify(&self.build_subdir_label)
    }

    /// `<project_root>/<output_dir>`
    pub fn output_dir(&self, project: &ProjectConfig) -> PathBuf {
        self.project_root.join(&project.output_dir)
    }

    /// Path to a file under the gfile directory.
    pub fn gfile(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.gfile_dir.join(relative)
    }
}

/// Anchor `value` at the current directory without touching the filesystem.
fn absolute(field: &str, value: &str) -> Result<PathBuf, ConfigError> {
    std::path::absolute(value).map_err(|e| ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: format!("cannot resolve {value}: {e}"),
    })
}
