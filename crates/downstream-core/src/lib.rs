//! GitHub search downstream core library
//!
//! Discovers repositories with a code-hosting search query and, for each one,
//! waits on / selects / forks a build on the build orchestration service.
//!
//! ## Components
//!
//! - [`pager::RateLimitedPager`]: walks search pages, throttled by the API quota
//! - [`locator::RepositoryLocator`]: turns search results into [`RepositoryRef`]s
//! - [`policy`]: pure trigger decision for one build observation
//! - [`poll::BuildPollLoop`]: per-repository tick/timeout state machine
//! - [`orchestrator::Orchestrator`]: sequential driver for a whole run

pub mod config;
pub mod domain;
pub mod fakes;
pub mod locator;
pub mod orchestrator;
pub mod pager;
pub mod params;
pub mod policy;
pub mod poll;
pub mod remote;
pub mod report;
pub mod telemetry;

pub use config::{PluginConfig, PollMode, DEFAULT_GITHUB_API_URL, DEFAULT_TIMEOUT};
pub use domain::{
    BuildRecord, BuildStatus, ConfigError, OrchestrationError, RateLimitSignal, RemoteError,
    RepositoryRef, Result, SearchPage,
};
pub use locator::RepositoryLocator;
pub use orchestrator::{Orchestrator, RunSummary};
pub use pager::RateLimitedPager;
pub use params::{EnvLookup, ProcessEnv, TriggerParams};
pub use policy::{decide, select_last_successful, TriggerDecision};
pub use poll::{BuildPollLoop, PollOutcome, PollSettings, PollState, TICK_INTERVAL};
pub use remote::{BuildApi, RepoSearchApi};
pub use report::{ConsoleReporter, Reporter};
pub use telemetry::init_tracing;
