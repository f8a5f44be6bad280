//! Ephemeral CLI - delete posts that have outlived their retention window
//!
//! Required environment: `TWITTER_CONSUMER_KEY`, `TWITTER_CONSUMER_SECRET`,
//! `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`, `MAX_TWEET_AGE`,
//! `TWEPOCH`.
//!
//! Try it first with `ephemeral --test`.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ephemeral_core::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ephemeral")]
#[command(about = "Delete posts older than a retention window, keeping anything before the epoch", long_about = None)]
#[command(version)]
struct Cli {
    /// Just test what would happen: evaluate and log, never delete
    #[arg(long)]
    test: bool,

    /// Verbose output
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    /// `--test` implies `--verbose`
    fn verbose(&self) -> bool {
        self.verbose || self.test
    }

    fn default_level(&self) -> &'static str {
        if self.verbose() { "info" } else { "warn" }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.default_level())),
        )
        .init();

    tracing::info!(version = ephemeral_core::VERSION, dry_run = cli.test, "Running ephemeral...");

    let config = EphemeralConfig::load().context("Failed to load configuration")?;
    let client = TwitterClient::new(config.credentials.clone(), &config.api)
        .context("Failed to create API client")?;

    let report = Sweeper::new(Arc::new(client), config.policy.clone())
        .dry_run(cli.test)
        .page_size(config.api.page_size)
        .include_reposts(config.api.include_reposts)
        .run()
        .await
        .context("Could not get timeline")?;

    if report.failed() > 0 {
        tracing::warn!(failed = report.failed(), "Some posts could not be deleted");
    }

    Ok(())
}
