//! Command-line flags and their environment fallbacks.

use std::time::Duration;

use clap::Parser;
use downstream_core::{EnvLookup, PluginConfig, DEFAULT_GITHUB_API_URL};

#[derive(Parser, Debug)]
#[command(name = "github-search-downstream")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Trigger Drone builds for every repository matching a GitHub search",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    pub json: bool,

    /// GitHub repository search query
    #[arg(long, env = "PLUGIN_GITHUB_QUERY")]
    pub github_query: Option<String>,

    /// GitHub token used for the search
    #[arg(long, env = "PLUGIN_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub API root (GitHub Enterprise: https://host/api/v3)
    #[arg(long, env = "PLUGIN_GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
    pub github_api_url: String,

    /// Branch to build in every discovered repository
    #[arg(long, env = "PLUGIN_BRANCH")]
    pub branch: Option<String>,

    /// Drone server address
    #[arg(long, env = "PLUGIN_DRONE_SERVER")]
    pub drone_server: Option<String>,

    /// Drone API token
    #[arg(long, env = "PLUGIN_DRONE_TOKEN", hide_env_values = true)]
    pub drone_token: Option<String>,

    /// Fork the build (always on; kept for plugin compatibility)
    #[arg(long, env = "PLUGIN_FORK")]
    pub fork: bool,

    /// Wait for a running build to finish before triggering
    #[arg(long, env = "PLUGIN_WAIT")]
    pub wait: bool,

    /// How long to wait on a running build, e.g. 90s or 2m30s
    #[arg(long, env = "PLUGIN_WAIT_TIMEOUT", default_value = "60s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Trigger the last successful build instead of the latest
    #[arg(long, env = "PLUGIN_LAST_SUCCESSFUL")]
    pub last_successful: bool,

    /// Skip repositories whose latest build cannot be fetched
    #[arg(long, env = "PLUGIN_IGNORE_MISSING")]
    pub ignore_missing: bool,

    /// Build parameters: KEY=VALUE pairs or paths to KEY=VALUE files
    #[arg(long, env = "PLUGIN_PARAMS", value_delimiter = ',')]
    pub params: Vec<String>,

    /// Environment variables passed through as build parameters
    #[arg(long, env = "PLUGIN_PARAMS_FROM_ENV", value_delimiter = ',')]
    pub params_from_env: Vec<String>,
}

fn first_env(env: &dyn EnvLookup, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env.lookup(key))
        .find(|value| !value.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Cli {
    /// Fill unset values from the secondary environment names, then build
    /// the run configuration.
    pub fn into_config(self, env: &dyn EnvLookup) -> PluginConfig {
        let github_query = non_empty(self.github_query)
            .or_else(|| first_env(env, &["GITHUB_SEARCH_DOWNSTREAM_GITHUB_QUERY"]));
        let github_token = non_empty(self.github_token).or_else(|| {
            first_env(
                env,
                &["GITHUB_TOKEN", "GITHUB_SEARCH_DOWNSTREAM_GITHUB_TOKEN"],
            )
        });
        let branch = non_empty(self.branch)
            .or_else(|| first_env(env, &["GITHUB_SEARCH_DOWNSTREAM_BRANCH"]));
        let drone_server = non_empty(self.drone_server)
            .or_else(|| first_env(env, &["GITHUB_SEARCH_DOWNSTREAM_DRONE_SERVER"]));
        let drone_token = non_empty(self.drone_token).or_else(|| {
            first_env(
                env,
                &["DRONE_TOKEN", "GITHUB_SEARCH_DOWNSTREAM_DRONE_TOKEN"],
            )
        });

        PluginConfig {
            github_query: github_query.unwrap_or_default(),
            github_token,
            github_api_url: self.github_api_url,
            drone_server: drone_server.unwrap_or_default(),
            drone_token: drone_token.unwrap_or_default(),
            branch,
            fork: self.fork,
            wait: self.wait,
            last_successful: self.last_successful,
            ignore_missing: self.ignore_missing,
            timeout: self.timeout,
            params: drop_blank(self.params),
            params_from_env: drop_blank(self.params_from_env),
        }
    }
}

fn drop_blank(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Parse a duration such as `60s`, `1m30s`, `1.5h` or `250ms`.
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare integer is
/// taken as seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(seconds) = input.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    let mut total = 0f64;
    let mut rest = input;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration {input:?}"));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration {input:?}"))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds_per_unit = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "" => return Err(format!("missing unit in duration {input:?}")),
            unit => return Err(format!("unknown unit {unit:?} in duration {input:?}")),
        };
        rest = &rest[unit_len..];
        total += value * seconds_per_unit;
    }

    Duration::try_from_secs_f64(total).map_err(|e| format!("invalid duration {input:?}: {e}"))
}
