#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Serpents session.

mod config;
mod session;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{Cli, Settings};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

/// Entry point for the Serpents command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;
    tracing::debug!(?settings, "settings resolved");

    let summary = session::run(&settings)?;
    if settings.json {
        let snapshot = serde_json::to_string_pretty(&summary.snapshot)
            .context("failed to serialise session snapshot")?;
        println!("{snapshot}");
    } else {
        print!("{summary}");
    }
    Ok(())
}
