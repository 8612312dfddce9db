//! In-memory fakes for the remote traits (testing only)
//!
//! Provides `PagedSearchApi`, `ScriptedBuildApi`, `RecordingReporter`, and
//! `MapEnv` that satisfy the trait contracts without any network access.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{BuildRecord, BuildStatus, RateLimitSignal, RemoteError, RepositoryRef, SearchPage};
use crate::params::{EnvLookup, TriggerParams};
use crate::remote::{BuildApi, RepoSearchApi};
use crate::report::{self, Reporter};

// ---------------------------------------------------------------------------
// MapEnv
// ---------------------------------------------------------------------------

/// [`EnvLookup`] backed by a map.
#[derive(Debug, Default, Clone)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl EnvLookup for MapEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// [`Reporter`] that keeps every progress line in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl Reporter for RecordingReporter {
    fn repository_added(&self, repo: &RepositoryRef) {
        self.push(report::added_line(repo));
    }

    fn waiting_on_build(&self, repo: &RepositoryRef, build: &BuildRecord, timeout: Duration) {
        self.push(report::waiting_line(repo, build, timeout));
    }

    fn repository_skipped(&self, repo: &RepositoryRef) {
        self.push(report::skipped_line(repo));
    }

    fn build_started(
        &self,
        repo: &RepositoryRef,
        build_number: u64,
        params: &TriggerParams,
        env_keys: &[String],
    ) {
        let lines = report::started_lines(repo, build_number, params, env_keys);
        self.lines.lock().unwrap().extend(lines);
    }
}

// ---------------------------------------------------------------------------
// PagedSearchApi
// ---------------------------------------------------------------------------

/// Search API serving fixed pages; `last_page` is the number of pages.
#[derive(Debug)]
pub struct PagedSearchApi {
    pages: Vec<Vec<String>>,
    signals: HashMap<u32, RateLimitSignal>,
    fail_on: Option<u32>,
    calls: Mutex<Vec<(u32, tokio::time::Instant)>>,
}

impl PagedSearchApi {
    pub fn new(pages: Vec<Vec<String>>) -> Self {
        Self {
            pages,
            signals: HashMap::new(),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Attach a rate-limit signal to the response for `page`.
    pub fn with_signal(mut self, page: u32, signal: RateLimitSignal) -> Self {
        self.signals.insert(page, signal);
        self
    }

    /// Fail the request for `page`.
    pub fn failing_on(mut self, page: u32) -> Self {
        self.fail_on = Some(page);
        self
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.calls.lock().unwrap().iter().map(|(p, _)| *p).collect()
    }

    pub fn call_instants(&self) -> Vec<tokio::time::Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl RepoSearchApi for PagedSearchApi {
    async fn search_repositories(
        &self,
        _query: &str,
        page: u32,
    ) -> Result<(SearchPage, RateLimitSignal), RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push((page, tokio::time::Instant::now()));

        if self.fail_on == Some(page) {
            return Err(RemoteError::Status {
                status: 422,
                body: "Validation Failed".to_string(),
            });
        }

        let items = self
            .pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_default();
        let last_page = self.pages.len() as u32;
        let signal = self
            .signals
            .get(&page)
            .copied()
            .unwrap_or_else(RateLimitSignal::unlimited);
        Ok((SearchPage::new(items, page, last_page), signal))
    }
}

// ---------------------------------------------------------------------------
// ScriptedBuildApi
// ---------------------------------------------------------------------------

/// A successful fork recorded by [`ScriptedBuildApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkCall {
    pub repo: String,
    pub number: u64,
    pub params: TriggerParams,
}

#[derive(Debug, Default)]
struct RepoScript {
    latest: VecDeque<Result<BuildRecord, RemoteError>>,
    history: Option<Result<Vec<BuildRecord>, RemoteError>>,
    forks: VecDeque<Result<(), RemoteError>>,
    latest_calls: usize,
    history_calls: usize,
    fork_attempts: usize,
}

/// Build API replaying scripted responses per `owner/name`.
///
/// Latest-build responses are consumed in order; the final one repeats.
/// A repository without a script answers 404. Forks succeed unless a fork
/// result was queued. Every call sleeps for the configured latency first.
#[derive(Debug, Default)]
pub struct ScriptedBuildApi {
    scripts: Mutex<HashMap<String, RepoScript>>,
    forks: Mutex<Vec<ForkCall>>,
    latency: Duration,
}

impl ScriptedBuildApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a latest-build response for `repo`.
    pub fn latest(self, repo: &str, response: Result<BuildRecord, RemoteError>) -> Self {
        self.script(repo, |s| s.latest.push_back(response));
        self
    }

    /// Set the build history for `repo`.
    pub fn history(self, repo: &str, response: Result<Vec<BuildRecord>, RemoteError>) -> Self {
        self.script(repo, |s| s.history = Some(response));
        self
    }

    /// Queue a fork outcome for `repo`.
    pub fn fork_result(self, repo: &str, response: Result<(), RemoteError>) -> Self {
        self.script(repo, |s| s.forks.push_back(response));
        self
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Successful forks, in order.
    pub fn forks(&self) -> Vec<ForkCall> {
        self.forks.lock().unwrap().clone()
    }

    pub fn latest_calls(&self, repo: &str) -> usize {
        self.read(repo, |s| s.latest_calls)
    }

    pub fn history_calls(&self, repo: &str) -> usize {
        self.read(repo, |s| s.history_calls)
    }

    pub fn fork_attempts(&self, repo: &str) -> usize {
        self.read(repo, |s| s.fork_attempts)
    }

    fn script(&self, repo: &str, f: impl FnOnce(&mut RepoScript)) {
        let mut scripts = self.scripts.lock().unwrap();
        f(scripts.entry(repo.to_string()).or_default());
    }

    fn read(&self, repo: &str, f: impl FnOnce(&RepoScript) -> usize) -> usize {
        self.scripts.lock().unwrap().get(repo).map(f).unwrap_or(0)
    }

    async fn respond_later(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn not_found(repo: &str) -> RemoteError {
    RemoteError::Status {
        status: 404,
        body: format!("repository {repo} not found"),
    }
}

#[async_trait]
impl BuildApi for ScriptedBuildApi {
    async fn latest_build(
        &self,
        owner: &str,
        name: &str,
        _branch: Option<&str>,
    ) -> Result<BuildRecord, RemoteError> {
        self.respond_later().await;
        let repo = format!("{owner}/{name}");
        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(&repo) else {
            return Err(not_found(&repo));
        };
        script.latest_calls += 1;
        if script.latest.len() > 1 {
            script.latest.pop_front().unwrap_or_else(|| Err(not_found(&repo)))
        } else {
            script
                .latest
                .front()
                .cloned()
                .unwrap_or_else(|| Err(not_found(&repo)))
        }
    }

    async fn build_history(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Vec<BuildRecord>, RemoteError> {
        self.respond_later().await;
        let repo = format!("{owner}/{name}");
        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(&repo) else {
            return Err(not_found(&repo));
        };
        script.history_calls += 1;
        script.history.clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fork_build(
        &self,
        owner: &str,
        name: &str,
        number: u64,
        params: &TriggerParams,
    ) -> Result<BuildRecord, RemoteError> {
        self.respond_later().await;
        let repo = format!("{owner}/{name}");
        {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.entry(repo.clone()).or_default();
            script.fork_attempts += 1;
            script.forks.pop_front().unwrap_or(Ok(()))?;
        }

        let mut forks = self.forks.lock().unwrap();
        forks.push(ForkCall {
            repo,
            number,
            params: params.clone(),
        });
        let new_number = 1000 + forks.len() as u64;
        Ok(BuildRecord::new(new_number, BuildStatus::Pending, ""))
    }
}
