//! Watch command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use sitebridge_core::BridgeConfig;
use sitebridge_core::error::{AuthError, Error};
use sitebridge_http::{OrderStatus, TrackingClient};

use crate::output;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between polls (default: poll_interval_secs from config)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Stop after this many polls
    #[arg(long)]
    pub count: Option<u64>,
}

/// One poll, printed as a JSON line.
#[derive(Debug, Serialize)]
struct Poll {
    at: DateTime<Utc>,
    status: Option<OrderStatus>,
}

pub async fn run(args: WatchArgs, config: &BridgeConfig) -> Result<()> {
    let mut client =
        TrackingClient::from_config(config).context("Failed to build tracking client")?;

    let interval = args
        .interval
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.poll_interval());
    let mut ticker = tokio::time::interval(interval);
    let mut polls = 0u64;

    info!(interval_secs = interval.as_secs(), "Watching order status");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match client.current_status().await {
                    Ok(status) => output::json(&Poll { at: Utc::now(), status })?,
                    Err(err @ Error::Auth(AuthError::InvalidCredentials { .. })) => {
                        return Err(anyhow::Error::new(err).context("Credentials rejected, stopping"));
                    }
                    Err(err) => {
                        warn!(error = %err, "Status poll failed");
                        output::warning(&format!("poll failed: {err}"));
                    }
                }

                polls += 1;
                if args.count.is_some_and(|count| polls >= count) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break;
            }
        }
    }

    Ok(())
}
