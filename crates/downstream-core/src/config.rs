//! Run configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ConfigError;

/// Default GitHub REST endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default time to wait on a running build before giving up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How the poll loop treats the latest build it observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollMode {
    /// Wait for a pending/running build to finish, then fork it.
    Wait,
    /// Fork the most recent successful build.
    LastSuccessful,
    /// Fork the latest build whatever its status.
    Immediate,
}

/// Everything a run needs, built once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// GitHub repository search query.
    pub github_query: String,
    /// Token for GitHub search; unauthenticated when `None`.
    pub github_token: Option<String>,
    /// GitHub REST endpoint (override for GitHub Enterprise).
    pub github_api_url: String,
    /// Drone server address.
    pub drone_server: String,
    /// Drone API token.
    pub drone_token: String,
    /// Branch override applied to every discovered repository.
    pub branch: Option<String>,
    /// Accepted for compatibility; every trigger is a fork.
    pub fork: bool,
    pub wait: bool,
    pub last_successful: bool,
    /// Skip repositories whose latest build cannot be fetched.
    pub ignore_missing: bool,
    /// Per-repository polling timeout.
    pub timeout: Duration,
    /// `KEY=VALUE` tokens or paths to `KEY=VALUE` files.
    pub params: Vec<String>,
    /// Names of environment variables to pass as parameters.
    pub params_from_env: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        PluginConfig {
            github_query: String::new(),
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            drone_server: String::new(),
            drone_token: String::new(),
            branch: None,
            fork: false,
            wait: false,
            last_successful: false,
            ignore_missing: false,
            timeout: DEFAULT_TIMEOUT,
            params: Vec::new(),
            params_from_env: Vec::new(),
        }
    }
}

impl PluginConfig {
    /// Create a config with the required fields set.
    pub fn new(github_query: &str, drone_server: &str, drone_token: &str) -> Self {
        PluginConfig {
            github_query: github_query.to_string(),
            drone_server: drone_server.to_string(),
            drone_token: drone_token.to_string(),
            ..Self::default()
        }
    }

    /// Check required fields and mode flags, returning the poll mode.
    pub fn validate(&self) -> Result<PollMode, ConfigError> {
        if self.github_query.is_empty() {
            return Err(ConfigError::MissingQuery);
        }
        if self.drone_token.is_empty() {
            return Err(ConfigError::MissingDroneToken);
        }
        if self.drone_server.is_empty() {
            return Err(ConfigError::MissingDroneServer);
        }
        match (self.wait, self.last_successful) {
            (true, true) => Err(ConfigError::ConflictingModes),
            (true, false) => Ok(PollMode::Wait),
            (false, true) => Ok(PollMode::LastSuccessful),
            (false, false) => Ok(PollMode::Immediate),
        }
    }
}
