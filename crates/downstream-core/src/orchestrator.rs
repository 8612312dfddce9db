//! Run orchestration: validate, discover, then poll each repository in turn.
//!
//! The full repository list is materialised before the first build is
//! touched. Repositories are processed strictly sequentially; the first
//! run-level error stops the run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::PluginConfig;
use crate::domain::{RepositoryRef, Result};
use crate::locator::RepositoryLocator;
use crate::pager::RateLimitedPager;
use crate::params::{EnvLookup, ProcessEnv, TriggerParams};
use crate::poll::{BuildPollLoop, PollOutcome, PollSettings};
use crate::remote::{BuildApi, RepoSearchApi};
use crate::report::{ConsoleReporter, Reporter};

/// What a successful run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Repositories (`owner/name[@branch]`) that got a new build.
    pub triggered: Vec<String>,
    /// Repositories skipped because their latest build could not be fetched.
    pub skipped: Vec<String>,
}

/// Drives discovery and the per-repository poll loops.
pub struct Orchestrator {
    search: Arc<dyn RepoSearchApi>,
    builds: Arc<dyn BuildApi>,
    reporter: Arc<dyn Reporter>,
    env: Arc<dyn EnvLookup>,
}

impl Orchestrator {
    /// Orchestrator printing to stdout and reading the process environment.
    pub fn new(search: Arc<dyn RepoSearchApi>, builds: Arc<dyn BuildApi>) -> Self {
        Self {
            search,
            builds,
            reporter: Arc::new(ConsoleReporter),
            env: Arc::new(ProcessEnv),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_env(mut self, env: Arc<dyn EnvLookup>) -> Self {
        self.env = env;
        self
    }

    /// Execute one run.
    ///
    /// Configuration and parameters are checked before any remote call.
    pub async fn run(&self, config: &PluginConfig) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        self.run_inner(config)
            .instrument(info_span!("run", %run_id))
            .await
    }

    async fn run_inner(&self, config: &PluginConfig) -> Result<RunSummary> {
        let mode = config.validate()?;
        let params = TriggerParams::build(&config.params, &config.params_from_env, &*self.env)?;
        let settings = PollSettings {
            mode,
            timeout: config.timeout,
            ignore_missing: config.ignore_missing,
        };

        let repos = self.discover(config).await?;
        info!(repositories = repos.len(), ?mode, "discovery complete");

        let mut summary = RunSummary::default();
        for repo in &repos {
            let outcome = BuildPollLoop::new(
                repo,
                &*self.builds,
                &*self.reporter,
                &params,
                &config.params_from_env,
                settings,
            )
            .run()
            .instrument(info_span!("repository", repository = %repo))
            .await?;

            match outcome {
                PollOutcome::Triggered { .. } => summary.triggered.push(repo.to_string()),
                PollOutcome::Skipped => summary.skipped.push(repo.to_string()),
            }
        }

        info!(
            triggered = summary.triggered.len(),
            skipped = summary.skipped.len(),
            "run complete"
        );
        Ok(summary)
    }

    /// Search every page and build the ordered repository list.
    ///
    /// Repositories are reported as each page arrives.
    pub async fn discover(&self, config: &PluginConfig) -> Result<Vec<RepositoryRef>> {
        let locator = RepositoryLocator::new(config.branch.clone());
        let mut repos = Vec::new();
        RateLimitedPager::new(Arc::clone(&self.search))
            .fetch_each(&config.github_query, |page| {
                for repo in locator.build(&page)? {
                    self.reporter.repository_added(&repo);
                    repos.push(repo);
                }
                Ok(())
            })
            .await?;
        Ok(repos)
    }
}
