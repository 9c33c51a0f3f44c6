//! Environment handed to every child process.
//!
//! ci-shim never exports into its own process environment. The derived
//! variables live in a [`ChildEnvironment`] and are applied per command.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::context::BuildContext;
use crate::error::ConfigError;

pub const ENV_UNBUFFERED: &str = "PYTHONUNBUFFERED";
pub const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_PROJECT_ID: &str = "PROJECT_ID";

pub const SERVICE_ACCOUNT_FILE: &str = "service-account.json";
pub const PROJECT_ID_FILE: &str = "project-id.json";

/// Ordered set of variables added to child processes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChildEnvironment(BTreeMap<String, String>);

impl ChildEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the build environment from the gfile directory.
    ///
    /// The credentials file is only referenced by path, but it must exist.
    /// The project id is the verbatim file content minus trailing newlines.
    pub fn derive(ctx: &BuildContext) -> Result<Self, ConfigError> {
        let mut env = Self::new();
        env.set(ENV_UNBUFFERED, "1");

        let credentials = ctx.gfile(SERVICE_ACCOUNT_FILE);
        if !credentials.is_file() {
            return Err(ConfigError::FileNotFound {
                path: credentials.display().to_string(),
            });
        }
        env.set(ENV_CREDENTIALS, credentials.display().to_string());

        let project_id_path = ctx.gfile(PROJECT_ID_FILE);
        let project_id = std::fs::read_to_string(&project_id_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: project_id_path.display().to_string(),
                }
            } else {
                ConfigError::Unreadable {
                    path: project_id_path.display().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        env.set(ENV_PROJECT_ID, project_id.trim_end_matches(['\n', '\r']));

        Ok(env)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::session::SessionSelector;

    fn context_for(gfile: PathBuf) -> BuildContext {
        BuildContext {
            project_root: PathBuf::from("."),
            artifacts_dir: None,
            gfile_dir: gfile,
            build_subdir_label: String::new(),
            session: SessionSelector::all(),
        }
    }

    #[test]
    fn derive_sets_all_three_variables() {
        let gfile = tempfile::tempdir().unwrap();
        fs::write(gfile.path().join(SERVICE_ACCOUNT_FILE), "{}").unwrap();
        fs::write(gfile.path().join(PROJECT_ID_FILE), "my-project\n").unwrap();

        let env = ChildEnvironment::derive(&context_for(gfile.path().to_path_buf())).unwrap();

        assert_eq!(env.get(ENV_UNBUFFERED), Some("1"));
        assert_eq!(
            env.get(ENV_CREDENTIALS).map(PathBuf::from),
            Some(gfile.path().join(SERVICE_ACCOUNT_FILE))
        );
        assert_eq!(env.get(ENV_PROJECT_ID), Some("my-project"));
        assert_eq!(env.len(), 3);
    }

    #[test]
    fn project_id_content_is_used_verbatim() {
        let gfile = tempfile::tempdir().unwrap();
        fs::write(gfile.path().join(SERVICE_ACCOUNT_FILE), "{}").unwrap();
        fs::write(gfile.path().join(PROJECT_ID_FILE), "\"quoted id\"").unwrap();

        let env = ChildEnvironment::derive(&context_for(gfile.path().to_path_buf())).unwrap();
        assert_eq!(env.get(ENV_PROJECT_ID), Some("\"quoted id\""));
    }

    #[test]
    fn missing_credentials_is_config_error() {
        let gfile = tempfile::tempdir().unwrap();
        fs::write(gfile.path().join(PROJECT_ID_FILE), "p").unwrap();

        let err = ChildEnvironment::derive(&context_for(gfile.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { ref path } if path.contains(SERVICE_ACCOUNT_FILE)));
    }

    #[test]
    fn missing_project_id_is_config_error() {
        let gfile = tempfile::tempdir().unwrap();
        fs::write(gfile.path().join(SERVICE_ACCOUNT_FILE), "{}").unwrap();

        let err = ChildEnvironment::derive(&context_for(gfile.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { ref path } if path.contains(PROJECT_ID_FILE)));
    }

    #[test]
    fn project_id_directory_is_unreadable() {
        let gfile = tempfile::tempdir().unwrap();
        fs::write(gfile.path().join(SERVICE_ACCOUNT_FILE), "{}").unwrap();
        fs::create_dir(gfile.path().join(PROJECT_ID_FILE)).unwrap();

        let err = ChildEnvironment::derive(&context_for(gfile.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }
}
