//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::export::ExportArgs;
use crate::commands::login::LoginArgs;
use crate::commands::status::StatusArgs;
use crate::commands::token::TokenArgs;
use crate::commands::watch::WatchArgs;

/// Session-managed client for sites without a public API.
#[derive(Parser, Debug)]
#[command(name = "sitebridge")]
#[command(author, version = env!("SITEBRIDGE_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Config file (defaults to $SITEBRIDGE_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in to a target and report the session
    Login(LoginArgs),

    /// Mint a single-use export token
    Token(TokenArgs),

    /// Export a report as JSON rows
    Export(ExportArgs),

    /// Show the current order status
    Status(StatusArgs),

    /// Poll the order status on an interval
    Watch(WatchArgs),
}
