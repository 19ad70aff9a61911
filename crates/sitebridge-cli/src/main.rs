//! sitebridge - CLI for session-managed scraping clients.
//!
//! A thin wrapper over `sitebridge-http`: every command loads the config,
//! builds one client and prints a single JSON document on stdout.

mod cli;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use sitebridge_core::BridgeConfig;

use cli::{Cli, Commands};
use commands::{export, login, status, token, watch};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let path = BridgeConfig::resolve_path(cli.config, |key| std::env::var(key).ok());
    let config = BridgeConfig::load_with_env(path.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Login(args) => login::run(args, &config).await,
        Commands::Token(args) => token::run(args, &config).await,
        Commands::Export(args) => export::run(args, &config).await,
        Commands::Status(args) => status::run(args, &config).await,
        Commands::Watch(args) => watch::run(args, &config).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
