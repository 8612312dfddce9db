//! Domain model shared by discovery, polling, and triggering.

pub mod build;
pub mod error;
pub mod repo_ref;
pub mod search;

pub use build::{BuildRecord, BuildStatus};
pub use error::{ConfigError, OrchestrationError, RemoteError, Result};
pub use repo_ref::{split_repo_branch, RepositoryRef};
pub use search::{RateLimitSignal, SearchPage};
