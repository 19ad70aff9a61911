//! Status command implementation.

use anyhow::{Context, Result};
use clap::Args;

use sitebridge_core::BridgeConfig;
use sitebridge_http::TrackingClient;

use crate::output;

#[derive(Args, Debug)]
pub struct StatusArgs {}

pub async fn run(_args: StatusArgs, config: &BridgeConfig) -> Result<()> {
    let mut client =
        TrackingClient::from_config(config).context("Failed to build tracking client")?;

    let status = client
        .current_status()
        .await
        .context("Failed to fetch order status")?;

    if status.is_none() {
        output::progress("No active order");
    }
    output::json_pretty(&status)
}
