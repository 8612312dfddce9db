//! GitHub search downstream trigger
//!
//! The `github-search-downstream` command searches GitHub for repositories
//! and triggers a new Drone build for each one, optionally waiting on a
//! running build or reusing the last successful one.

mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use downstream_core::{Orchestrator, ProcessEnv};
use downstream_remote::{DroneClient, DroneConfig, GitHubConfig, GitHubSearchClient};
use tracing::{info, Level};

use args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    downstream_core::init_tracing(cli.json, level);

    let config = cli.into_config(&ProcessEnv);
    let mode = config.validate()?;
    info!(?mode, query = %config.github_query, "starting run");

    let mut github = GitHubConfig::new(&config.github_api_url);
    if let Some(token) = &config.github_token {
        github = github.with_token(token);
    }
    let search =
        GitHubSearchClient::new(github).context("Failed to create GitHub search client")?;
    let builds = DroneClient::new(DroneConfig::new(&config.drone_server, &config.drone_token))
        .context("Failed to create Drone client")?;

    let summary = Orchestrator::new(Arc::new(search), Arc::new(builds))
        .run(&config)
        .await?;

    info!(
        triggered = summary.triggered.len(),
        skipped = summary.skipped.len(),
        "done"
    );
    Ok(())
}
