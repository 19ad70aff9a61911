//! Login command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use sitebridge_core::traits::Authenticate;
use sitebridge_core::{BridgeConfig, Target};
use sitebridge_http::{ExportClient, SessionClient, TrackingClient};

use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Site to log in to (export or tracking)
    #[arg(long, default_value = "export")]
    pub target: Target,
}

/// What a fresh login produced. Cookie values are never printed.
#[derive(Debug, Serialize)]
struct SessionReport {
    target: Target,
    base_url: String,
    identifier: String,
    cookies: Vec<String>,
    authenticated_at: Option<DateTime<Utc>>,
}

pub async fn run(args: LoginArgs, config: &BridgeConfig) -> Result<()> {
    let identifier = config.credentials(args.target)?.masked_identifier();

    output::progress(&format!("Logging in to {}...", args.target));

    let report = match args.target {
        Target::Export => {
            let mut client =
                ExportClient::from_config(config).context("Failed to build export client")?;
            client.login().await.context("Failed to login")?;
            report(args.target, identifier, client.session_client())
        }
        Target::Tracking => {
            let mut client =
                TrackingClient::from_config(config).context("Failed to build tracking client")?;
            client.login().await.context("Failed to login")?;
            report(args.target, identifier, client.session_client())
        }
    };

    output::success("Logged in successfully");
    output::field("Target", report.target.as_str());
    output::field("Base URL", &report.base_url);
    output::json_pretty(&report)
}

fn report(target: Target, identifier: String, client: &SessionClient) -> SessionReport {
    let session = client.session();
    SessionReport {
        target,
        base_url: client.base().to_string(),
        identifier,
        cookies: session.cookies().names().map(str::to_string).collect(),
        authenticated_at: session.last_auth_at(),
    }
}
