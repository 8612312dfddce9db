//! Tracing initialisation for the `github-search-downstream` binary.
//!
//! Diagnostics are written to stderr. Stdout carries only the progress lines
//! of [`crate::report::ConsoleReporter`], which CI log scrapers parse.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter from `RUST_LOG`, or `level` when it is unset or unparsable.
pub fn log_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber: `json` selects newline-delimited JSON.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let output = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let output = if json {
        output.json().boxed()
    } else {
        output.boxed()
    };

    tracing_subscriber::registry()
        .with(log_filter(level))
        .with(output)
        .try_init()
        .is_ok()
}
