//! Test-session selection.

use serde::Serialize;

/// Optional name of a single test session.
///
/// `None` requests the runner's full default session set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionSelector(Option<String>);

impl SessionSelector {
    /// Build from a raw value; empty or blank input selects the full set.
    pub fn new(raw: Option<&str>) -> Self {
        Self(
            raw.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        )
    }

    /// Full default session set.
    pub fn all() -> Self {
        Self(None)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_scoped(&self) -> bool {
        self.0.is_some()
    }

    /// Arguments appended to the runner invocation (`-s <name>` or nothing).
    pub fn runner_args(&self) -> Vec<String> {
        match &self.0 {
            Some(name) => vec!["-s".to_owned(), name.clone()],
            None => Vec::new(),
        }
    }
}
