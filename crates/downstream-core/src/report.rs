//! Human-readable progress lines.
//!
//! These go to stdout and are consumed by people and CI log scrapers, so the
//! wording is stable. Diagnostics belong in `tracing`, not here.

use std::time::Duration;

use crate::domain::{BuildRecord, RepositoryRef};
use crate::params::TriggerParams;

/// Placeholder printed instead of values sourced from the environment.
pub const FROM_ENVIRONMENT: &str = "[from-environment]";

/// Sink for progress events.
pub trait Reporter: Send + Sync {
    fn repository_added(&self, repo: &RepositoryRef);

    fn waiting_on_build(&self, repo: &RepositoryRef, build: &BuildRecord, timeout: Duration);

    fn repository_skipped(&self, repo: &RepositoryRef);

    fn build_started(
        &self,
        repo: &RepositoryRef,
        build_number: u64,
        params: &TriggerParams,
        env_keys: &[String],
    );
}

/// [`Reporter`] printing to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn repository_added(&self, repo: &RepositoryRef) {
        println!("{}", added_line(repo));
    }

    fn waiting_on_build(&self, repo: &RepositoryRef, build: &BuildRecord, timeout: Duration) {
        println!("{}", waiting_line(repo, build, timeout));
    }

    fn repository_skipped(&self, repo: &RepositoryRef) {
        println!("{}", skipped_line(repo));
    }

    fn build_started(
        &self,
        repo: &RepositoryRef,
        build_number: u64,
        params: &TriggerParams,
        env_keys: &[String],
    ) {
        for line in started_lines(repo, build_number, params, env_keys) {
            println!("{line}");
        }
    }
}

pub fn added_line(repo: &RepositoryRef) -> String {
    format!("Added {repo} to the downstream list.")
}

pub fn waiting_line(repo: &RepositoryRef, build: &BuildRecord, timeout: Duration) -> String {
    format!(
        "BuildLast for repository: {repo}, returned build number: {} with a status of {}. Will retry for {}.",
        build.number,
        build.status,
        format_duration(timeout)
    )
}

pub fn skipped_line(repo: &RepositoryRef) -> String {
    format!("Error: unable to get latest build for {repo}, skipping")
}

/// Confirmation plus one line per parameter; env-sourced values are masked.
pub fn started_lines(
    repo: &RepositoryRef,
    build_number: u64,
    params: &TriggerParams,
    env_keys: &[String],
) -> Vec<String> {
    let mut lines = vec![format!("Starting new build {build_number} for {repo}.")];
    if !params.is_empty() {
        lines.push("  with params:".to_string());
        for (key, value) in params.iter() {
            let shown = if env_keys.iter().any(|k| k == key) {
                FROM_ENVIRONMENT
            } else {
                value
            };
            lines.push(format!("  - {key}: {shown}"));
        }
    }
    lines
}

/// Render a duration the way Go prints one (`1m0s`, `90ms`, `1.5s`).
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    if d < Duration::from_secs(1) {
        let micros = d.as_micros();
        return if micros % 1000 == 0 {
            format!("{}ms", micros / 1000)
        } else {
            format!("{micros}µs")
        };
    }

    let total = d.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    let millis = d.subsec_millis();
    let seconds = if millis == 0 {
        seconds.to_string()
    } else {
        let frac = format!("{millis:03}");
        format!("{seconds}.{}", frac.trim_end_matches('0'))
    };

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
