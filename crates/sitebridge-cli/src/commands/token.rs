//! Token command implementation.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use sitebridge_core::BridgeConfig;
use sitebridge_http::ExportClient;

use crate::output;

#[derive(Args, Debug)]
pub struct TokenArgs {}

#[derive(Debug, Serialize)]
struct MintedToken<'a> {
    token: &'a str,
    minted_at: DateTime<Utc>,
}

pub async fn run(_args: TokenArgs, config: &BridgeConfig) -> Result<()> {
    let mut client = ExportClient::from_config(config).context("Failed to build export client")?;

    let Some(token) = client
        .mint_token()
        .await
        .context("Failed to mint export token")?
    else {
        bail!("The server answered without an export token. Run with -v for details.");
    };

    output::json_pretty(&MintedToken {
        token: token.as_str(),
        minted_at: token.minted_at(),
    })
}
