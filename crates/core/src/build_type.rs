//! Build-type classification of the CI trigger label.

use std::fmt;

use serde::Serialize;

/// Name of the structured result log written by the test runner.
pub const RESULT_LOG_NAME: &str = "sponge_log.xml";

/// CI trigger category, derived once from `KOKORO_BUILD_ARTIFACTS_SUBDIR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    /// Post-merge build; ships logs on exit.
    Continuous,
    /// Pre-submit check.
    Presubmit,
    /// Any label matching neither known category.
    Other,
}

impl BuildType {
    /// Classify a free-form label by substring.
    ///
    /// `continuous` takes precedence when a label mentions both categories.
    pub fn classify(label: &str) -> Self {
        if label.contains("continuous") {
            Self::Continuous
        } else if label.contains("presubmit") {
            Self::Presubmit
        } else {
            Self::Other
        }
    }

    /// Result log to collect, if any.
    ///
    /// `Other` builds collect nothing.
    pub fn result_log_name(self) -> Option<&'static str> {
        match self {
            Self::Continuous | Self::Presubmit => Some(RESULT_LOG_NAME),
            Self::Other => None,
        }
    }

    /// Whether the log shipper runs when the build finishes.
    pub fn ships_logs(self) -> bool {
        matches!(self, Self::Continuous)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Presubmit => "presubmit",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_continuous_label() {
        assert_eq!(
            BuildType::classify("ubuntu/continuous/build"),
            BuildType::Continuous
        );
    }

    #[test]
    fn classify_presubmit_label() {
        assert_eq!(
            BuildType::classify("prod:python-aiplatform/presubmit/system-3.8"),
            BuildType::Presubmit
        );
    }

    #[test]
    fn classify_unknown_label_falls_back_to_other() {
        assert_eq!(BuildType::classify("nightly/release"), BuildType::Other);
        assert_eq!(BuildType::classify(""), BuildType::Other);
    }

    #[test]
    fn classify_is_case_sensitive() {
        assert_eq!(BuildType::classify("Continuous"), BuildType::Other);
    }

    #[test]
    fn continuous_wins_when_both_present() {
        assert_eq!(
            BuildType::classify("presubmit-then-continuous"),
            BuildType::Continuous
        );
    }

    #[test]
    fn known_types_select_sponge_log() {
        assert_eq!(
            BuildType::Continuous.result_log_name(),
            Some("sponge_log.xml")
        );
        assert_eq!(
            BuildType::Presubmit.result_log_name(),
            Some("sponge_log.xml")
        );
        assert_eq!(BuildType::Other.result_log_name(), None);
    }

    #[test]
    fn only_continuous_ships_logs() {
        assert!(BuildType::Continuous.ships_logs());
        assert!(!BuildType::Presubmit.ships_logs());
        assert!(!BuildType::Other.ships_logs());
    }
}
