//! Injectable remote APIs.
//!
//! Implement these traits to plug in real HTTP clients or test stubs.

use async_trait::async_trait;

use crate::domain::{BuildRecord, RateLimitSignal, RemoteError, SearchPage};
use crate::params::TriggerParams;

/// Repository search on the code-hosting service.
#[async_trait]
pub trait RepoSearchApi: Send + Sync {
    /// Fetch one page of repositories matching `query`, most recently
    /// updated first.
    async fn search_repositories(
        &self,
        query: &str,
        page: u32,
    ) -> Result<(SearchPage, RateLimitSignal), RemoteError>;
}

/// Build lookup and triggering on the build orchestration service.
#[async_trait]
pub trait BuildApi: Send + Sync {
    /// Latest build of `owner/name`, on `branch` or the default branch.
    async fn latest_build(
        &self,
        owner: &str,
        name: &str,
        branch: Option<&str>,
    ) -> Result<BuildRecord, RemoteError>;

    /// Recent builds of `owner/name`, newest first.
    async fn build_history(&self, owner: &str, name: &str)
        -> Result<Vec<BuildRecord>, RemoteError>;

    /// Re-run build `number` under a new build number with `params`.
    async fn fork_build(
        &self,
        owner: &str,
        name: &str,
        number: u64,
        params: &TriggerParams,
    ) -> Result<BuildRecord, RemoteError>;
}
