//! Rate-limited pagination over repository search results.
//!
//! Pages are fetched in order starting at 1. The page count is unknown until
//! the first response arrives, so the upper bound starts unbounded and is
//! replaced by the `last_page` each response reports. Whenever the previous
//! response said the quota is (nearly) spent, the pager sleeps until the
//! advertised reset before issuing the next request.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{OrchestrationError, RateLimitSignal, RemoteError, Result, SearchPage};
use crate::remote::RepoSearchApi;

/// Seconds since the Unix epoch.
pub type EpochClock = fn() -> i64;

fn epoch_now() -> i64 {
    Utc::now().timestamp()
}

/// Walks every page of a search, throttled by the API's rate-limit signal.
pub struct RateLimitedPager {
    api: Arc<dyn RepoSearchApi>,
    clock: EpochClock,
}

impl RateLimitedPager {
    pub fn new(api: Arc<dyn RepoSearchApi>) -> Self {
        Self {
            api,
            clock: epoch_now,
        }
    }

    /// Replace the wall clock used to compute rate-limit waits.
    pub fn with_clock(mut self, clock: EpochClock) -> Self {
        self.clock = clock;
        self
    }

    /// Fetch a single page.
    pub async fn next_page(
        &self,
        query: &str,
        page: u32,
    ) -> std::result::Result<(SearchPage, RateLimitSignal), RemoteError> {
        debug!(page, "searching repositories");
        self.api.search_repositories(query, page).await
    }

    /// Fetch every page of `query` in order.
    ///
    /// Any failed page aborts discovery; no partial result is returned.
    pub async fn fetch_all(&self, query: &str) -> Result<Vec<SearchPage>> {
        let mut pages = Vec::new();
        self.fetch_each(query, |page| {
            pages.push(page);
            Ok(())
        })
        .await?;
        Ok(pages)
    }

    /// Fetch every page of `query` in order, handing each one to `on_page`
    /// as soon as it arrives.
    ///
    /// Stops at the first failed request or the first error from `on_page`.
    pub async fn fetch_each<F>(&self, query: &str, mut on_page: F) -> Result<()>
    where
        F: FnMut(SearchPage) -> Result<()>,
    {
        let mut last_page = u32::MAX;
        let mut signal: Option<RateLimitSignal> = None;
        let mut page = 1;

        while page <= last_page {
            if let Some(signal) = signal.filter(RateLimitSignal::is_exhausted) {
                self.backoff(signal).await;
            }

            let (result, next_signal) = self
                .next_page(query, page)
                .await
                .map_err(OrchestrationError::Discovery)?;

            debug!(
                page,
                last_page = result.last_page,
                items = result.items.len(),
                remaining = next_signal.remaining_calls,
                "search page received"
            );
            last_page = result.last_page;
            signal = Some(next_signal);
            on_page(result)?;
            page = match page.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(())
    }

    async fn backoff(&self, signal: RateLimitSignal) {
        let wait = signal.wait_from((self.clock)());
        info!(
            remaining = signal.remaining_calls,
            reset_at = signal.reset_at_epoch_seconds,
            wait_secs = wait.as_secs(),
            "search rate limit reached, waiting for reset"
        );
        tokio::time::sleep(wait).await;
    }
}
