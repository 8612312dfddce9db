//! Downstream-Remote: GitHub and Drone API clients
//!
//! HTTP implementations of the remote traits used by `downstream-core`:
//!
//! - [`GitHubSearchClient`]: repository search with rate-limit headers
//! - [`DroneClient`]: latest build, build history, and build forking

pub mod drone;
pub mod error;
pub mod github;

pub use drone::{DroneClient, DroneConfig};
pub use error::ClientError;
pub use github::{GitHubConfig, GitHubSearchClient, SEARCH_PAGE_SIZE};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("github-search-downstream/", env!("CARGO_PKG_VERSION"));
