//! Per-repository poll loop.
//!
//! Each repository gets one loop that waits on two timers: a 1-second tick
//! and the configured timeout. The deadline always wins when both are ready,
//! and it also cuts short any remote call still in flight.
//!
//! On every tick the latest build is fetched (`Ticking`), the trigger policy
//! is consulted (`Deciding`), and, when it says so, the selected build is
//! forked (`Triggering`). The loop ends in exactly one of:
//!
//! - `Ok(PollOutcome::Triggered)`: a new build was started
//! - `Ok(PollOutcome::Skipped)`: the latest build could not be fetched and
//!   `ignore_missing` is set
//! - `Err(OrchestrationError::Timeout)` or another run-level error
//!
//! Once an in-flight build has been seen in wait mode the loop is in
//! `WaitingRetry`: from then on lookup and trigger failures are treated as
//! transient and retried on the next tick until the deadline.

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::PollMode;
use crate::domain::{BuildRecord, OrchestrationError, RepositoryRef, Result};
use crate::params::TriggerParams;
use crate::policy::{self, TriggerDecision};
use crate::remote::BuildApi;
use crate::report::Reporter;

/// Fixed period between build status checks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Non-terminal loop state carried across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No in-flight build observed yet.
    Ticking,
    /// An in-flight build was observed once; remote failures are transient.
    WaitingRetry,
}

/// How a repository's loop ended when it did not fail the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Triggered { source_build: u64, new_build: u64 },
    Skipped,
}

/// Loop settings shared by every repository of a run.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub mode: PollMode,
    pub timeout: Duration,
    pub ignore_missing: bool,
}

/// Drives one repository from first tick to a terminal outcome.
pub struct BuildPollLoop<'a> {
    repo: &'a RepositoryRef,
    builds: &'a dyn BuildApi,
    reporter: &'a dyn Reporter,
    params: &'a TriggerParams,
    env_keys: &'a [String],
    settings: PollSettings,
    state: PollState,
}

impl<'a> BuildPollLoop<'a> {
    pub fn new(
        repo: &'a RepositoryRef,
        builds: &'a dyn BuildApi,
        reporter: &'a dyn Reporter,
        params: &'a TriggerParams,
        env_keys: &'a [String],
        settings: PollSettings,
    ) -> Self {
        Self {
            repo,
            builds,
            reporter,
            params,
            env_keys,
            settings,
            state: PollState::Ticking,
        }
    }

    /// Run until a build is triggered, the repository is skipped, the
    /// timeout fires, or a run-level error occurs.
    pub async fn run(mut self) -> Result<PollOutcome> {
        let deadline = tokio::time::sleep(self.settings.timeout);
        tokio::pin!(deadline);
        let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let repo = self.repo;
        let timeout = self.settings.timeout;
        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => return Err(timed_out(repo, timeout)),
                _ = ticker.tick() => {}
            }

            // Remote calls made by the tick still race the deadline.
            let outcome = tokio::select! {
                biased;
                _ = &mut deadline => return Err(timed_out(repo, timeout)),
                outcome = self.on_tick() => outcome?,
            };
            if let Some(outcome) = outcome {
                return Ok(outcome);
            }
        }
    }

    /// One tick. `Ok(None)` means keep ticking.
    async fn on_tick(&mut self) -> Result<Option<PollOutcome>> {
        let repo = self.repo;
        let build = match self
            .builds
            .latest_build(&repo.owner, &repo.name, repo.branch.as_deref())
            .await
        {
            Ok(build) => build,
            Err(error) if self.state == PollState::WaitingRetry => {
                warn!(repository = %repo, %error, "latest build lookup failed while waiting, retrying");
                return Ok(None);
            }
            Err(error) if self.settings.ignore_missing => {
                warn!(repository = %repo, %error, "latest build lookup failed, skipping repository");
                self.reporter.repository_skipped(repo);
                return Ok(Some(PollOutcome::Skipped));
            }
            Err(source) => {
                return Err(OrchestrationError::BuildLookup {
                    repository: repo.to_string(),
                    source,
                })
            }
        };

        let waited = self.state == PollState::WaitingRetry;
        let selected = match policy::decide(&build, self.settings.mode, waited) {
            TriggerDecision::KeepWaiting => {
                self.reporter
                    .waiting_on_build(repo, &build, self.settings.timeout);
                self.state = PollState::WaitingRetry;
                return Ok(None);
            }
            TriggerDecision::StillRunning => {
                debug!(repository = %repo, build = build.number, status = %build.status, "build still in progress");
                return Ok(None);
            }
            TriggerDecision::SearchHistory => self.last_successful(&build).await?,
            TriggerDecision::FireBuild => build,
        };

        self.trigger(&selected).await
    }

    /// Most recent successful build on the repository's branch, falling back
    /// to the branch of the latest build when no override is set.
    async fn last_successful(&self, latest: &BuildRecord) -> Result<BuildRecord> {
        let repo = self.repo;
        let history = self
            .builds
            .build_history(&repo.owner, &repo.name)
            .await
            .map_err(|source| OrchestrationError::BuildHistory {
                repository: repo.to_string(),
                source,
            })?;

        let branch = repo.branch.as_deref().unwrap_or(latest.branch.as_str());
        let found = policy::select_last_successful(&history, branch).cloned();
        match found {
            Some(build) => {
                debug!(repository = %repo, build = build.number, branch, "selected last successful build");
                Ok(build)
            }
            None => Err(OrchestrationError::HistoryExhausted {
                repository: repo.to_string(),
            }),
        }
    }

    async fn trigger(&self, build: &BuildRecord) -> Result<Option<PollOutcome>> {
        let repo = self.repo;
        match self
            .builds
            .fork_build(&repo.owner, &repo.name, build.number, self.params)
            .await
        {
            Ok(forked) => {
                info!(repository = %repo, source_build = build.number, new_build = forked.number, "triggered downstream build");
                self.reporter
                    .build_started(repo, build.number, self.params, self.env_keys);
                Ok(Some(PollOutcome::Triggered {
                    source_build: build.number,
                    new_build: forked.number,
                }))
            }
            Err(error) if self.state == PollState::WaitingRetry => {
                warn!(repository = %repo, %error, "trigger failed while waiting, retrying");
                Ok(None)
            }
            Err(source) => Err(OrchestrationError::Trigger {
                repository: repo.to_string(),
                source,
            }),
        }
    }
}

fn timed_out(repo: &RepositoryRef, timeout: Duration) -> OrchestrationError {
    warn!(repository = %repo, ?timeout, "timed out waiting on build");
    OrchestrationError::Timeout {
        repository: repo.to_string(),
    }
}
