//! Export command implementation.

use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::Args;

use sitebridge_core::{BridgeConfig, ExportKind, ExportRequest};
use sitebridge_http::ExportClient;

use crate::output;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Report to export (servings, daily-summary, exercises, biometrics, notes)
    #[arg(long, default_value = "servings")]
    pub kind: ExportKind,

    /// First day, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day, YYYY-MM-DD (default: the day after start)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Print one row per line instead of a single document
    #[arg(long)]
    pub lines: bool,
}

pub async fn run(args: ExportArgs, config: &BridgeConfig) -> Result<()> {
    let request = build_request(&args)?;
    let mut client = ExportClient::from_config(config).context("Failed to build export client")?;

    output::progress(&format!(
        "Exporting {} from {} to {}...",
        request.kind(),
        request.start(),
        request.end()
    ));

    let table = client
        .export(&request)
        .await
        .context("Failed to export")?;

    if args.lines {
        for row in &table.rows {
            output::json(row)?;
        }
        Ok(())
    } else {
        output::json_pretty(&table)
    }
}

fn build_request(args: &ExportArgs) -> Result<ExportRequest> {
    if args.start.is_none() && args.end.is_none() {
        return Ok(ExportRequest::today(args.kind));
    }

    let start = args.start.unwrap_or_else(|| Local::now().date_naive());
    let end = match args.end {
        Some(end) => end,
        None => next_day(start)?,
    };
    Ok(ExportRequest::new(args.kind, start, end)?)
}

fn next_day(day: NaiveDate) -> Result<NaiveDate> {
    day.checked_add_days(Days::new(1))
        .context("Start date is out of range")
}
