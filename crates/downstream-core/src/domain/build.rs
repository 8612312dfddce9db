//! Build records as reported by the build orchestration service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a remote build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Pending,
    Running,
    Success,
    Failure,
    Error,
    Killed,
    Skipped,
    Blocked,
    Declined,
    /// A status string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl BuildStatus {
    /// `true` while the build has not reached a terminal status.
    pub fn is_in_progress(self) -> bool {
        matches!(self, BuildStatus::Pending | BuildStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildStatus::Pending => "pending",
            BuildStatus::Running => "running",
            BuildStatus::Success => "success",
            BuildStatus::Failure => "failure",
            BuildStatus::Error => "error",
            BuildStatus::Killed => "killed",
            BuildStatus::Skipped => "skipped",
            BuildStatus::Blocked => "blocked",
            BuildStatus::Declined => "declined",
            BuildStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single build of a repository. Read-only from this crate's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub number: u64,
    pub status: BuildStatus,
    #[serde(default)]
    pub branch: String,
}

impl BuildRecord {
    pub fn new(number: u64, status: BuildStatus, branch: impl Into<String>) -> Self {
        Self {
            number,
            status,
            branch: branch.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_statuses() {
        assert!(BuildStatus::Pending.is_in_progress());
        assert!(BuildStatus::Running.is_in_progress());
        for s in [
            BuildStatus::Success,
            BuildStatus::Failure,
            BuildStatus::Error,
            BuildStatus::Killed,
            BuildStatus::Blocked,
            BuildStatus::Unknown,
        ] {
            assert!(!s.is_in_progress(), "{s} should be terminal");
        }
    }

    #[test]
    fn test_status_decodes_lowercase_and_unknown() {
        let ok: BuildStatus = serde_json::from_str("\"success\"").unwrap();
        assert_eq!(ok, BuildStatus::Success);
        let other: BuildStatus = serde_json::from_str("\"waiting_on_dependencies\"").unwrap();
        assert_eq!(other, BuildStatus::Unknown);
    }

    #[test]
    fn test_build_record_branch_defaults_to_empty() {
        let b: BuildRecord = serde_json::from_str(r#"{"number": 12, "status": "running"}"#).unwrap();
        assert_eq!(b, BuildRecord::new(12, BuildStatus::Running, ""));
    }
}
