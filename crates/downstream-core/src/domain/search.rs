//! Search result pages and the rate-limit signal attached to them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One page of repository search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Repository full names (`owner/name`) in the order the API returned them.
    pub items: Vec<String>,
    /// 1-based number of this page.
    pub page_number: u32,
    /// Last page number of the result set as reported with this page.
    pub last_page: u32,
}

impl SearchPage {
    pub fn new(items: Vec<String>, page_number: u32, last_page: u32) -> Self {
        Self {
            items,
            page_number,
            last_page,
        }
    }

    /// A page that reports no further pages after itself.
    pub fn last(items: Vec<String>, page_number: u32) -> Self {
        Self::new(items, page_number, page_number)
    }
}

/// Remaining API quota and when it resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSignal {
    pub remaining_calls: u64,
    pub reset_at_epoch_seconds: i64,
}

impl RateLimitSignal {
    pub fn new(remaining_calls: u64, reset_at_epoch_seconds: i64) -> Self {
        Self {
            remaining_calls,
            reset_at_epoch_seconds,
        }
    }

    /// Signal used when the API reported no quota headers.
    pub fn unlimited() -> Self {
        Self::new(u64::MAX, 0)
    }

    /// `true` when the next call must wait for the quota to reset.
    pub fn is_exhausted(&self) -> bool {
        self.remaining_calls <= 1
    }

    /// Time to wait from `now_epoch_seconds` until the reset.
    ///
    /// A reset that already appears to be in the past (clock skew) is
    /// sign-corrected rather than treated as zero.
    pub fn wait_from(&self, now_epoch_seconds: i64) -> Duration {
        Duration::from_secs(self.reset_at_epoch_seconds.abs_diff(now_epoch_seconds))
    }
}
