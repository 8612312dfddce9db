//! Trigger decision for a single observation of the latest build.

use crate::config::PollMode;
use crate::domain::{BuildRecord, BuildStatus};

/// What the poll loop should do with the build it just observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// First sighting of an in-flight build in wait mode: announce and wait.
    KeepWaiting,
    /// Already waiting and the build is still in flight: wait silently.
    StillRunning,
    /// Look up the most recent successful build and fork that.
    SearchHistory,
    /// Fork the observed build now.
    FireBuild,
}

/// Decide how to react to `build` under `mode`.
pub fn decide(build: &BuildRecord, mode: PollMode, already_waited: bool) -> TriggerDecision {
    let in_progress = build.status.is_in_progress();
    match mode {
        PollMode::Wait if in_progress && !already_waited => TriggerDecision::KeepWaiting,
        PollMode::Wait if in_progress => TriggerDecision::StillRunning,
        PollMode::LastSuccessful if build.status != BuildStatus::Success => {
            TriggerDecision::SearchHistory
        }
        _ => TriggerDecision::FireBuild,
    }
}

/// First successful build on `branch`, in list order.
pub fn select_last_successful<'a>(
    history: &'a [BuildRecord],
    branch: &str,
) -> Option<&'a BuildRecord> {
    history
        .iter()
        .find(|b| b.branch == branch && b.status == BuildStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(number: u64, status: BuildStatus) -> BuildRecord {
        BuildRecord::new(number, status, "main")
    }

    #[test]
    fn test_wait_mode_first_running_keeps_waiting() {
        for status in [BuildStatus::Pending, BuildStatus::Running] {
            assert_eq!(
                decide(&build(1, status), PollMode::Wait, false),
                TriggerDecision::KeepWaiting
            );
        }
    }

    #[test]
    fn test_wait_mode_later_running_stays_quiet() {
        assert_eq!(
            decide(&build(1, BuildStatus::Running), PollMode::Wait, true),
            TriggerDecision::StillRunning
        );
    }

    #[test]
    fn test_wait_mode_terminal_fires() {
        for status in [BuildStatus::Success, BuildStatus::Failure, BuildStatus::Killed] {
            assert_eq!(
                decide(&build(1, status), PollMode::Wait, false),
                TriggerDecision::FireBuild
            );
            assert_eq!(
                decide(&build(1, status), PollMode::Wait, true),
                TriggerDecision::FireBuild
            );
        }
    }

    #[test]
    fn test_last_successful_searches_unless_success() {
        assert_eq!(
            decide(&build(1, BuildStatus::Failure), PollMode::LastSuccessful, false),
            TriggerDecision::SearchHistory
        );
        assert_eq!(
            decide(&build(1, BuildStatus::Running), PollMode::LastSuccessful, false),
            TriggerDecision::SearchHistory
        );
        assert_eq!(
            decide(&build(1, BuildStatus::Success), PollMode::LastSuccessful, false),
            TriggerDecision::FireBuild
        );
    }

    #[test]
    fn test_immediate_always_fires() {
        for status in [BuildStatus::Running, BuildStatus::Pending, BuildStatus::Error] {
            assert_eq!(
                decide(&build(1, status), PollMode::Immediate, false),
                TriggerDecision::FireBuild
            );
        }
    }

    #[test]
    fn test_select_first_success_in_list_order() {
        let history = vec![
            build(10, BuildStatus::Failure),
            build(7, BuildStatus::Success),
            build(9, BuildStatus::Success),
        ];
        assert_eq!(select_last_successful(&history, "main").unwrap().number, 7);
    }

    #[test]
    fn test_select_ignores_other_branches() {
        let history = vec![
            BuildRecord::new(12, BuildStatus::Success, "feature"),
            BuildRecord::new(11, BuildStatus::Success, "main"),
        ];
        assert_eq!(select_last_successful(&history, "main").unwrap().number, 11);
        assert!(select_last_successful(&history, "release").is_none());
    }

    #[test]
    fn test_select_none_when_no_success() {
        let history = vec![build(3, BuildStatus::Failure), build(2, BuildStatus::Error)];
        assert!(select_last_successful(&history, "main").is_none());
        assert!(select_last_successful(&[], "main").is_none());
    }
}
