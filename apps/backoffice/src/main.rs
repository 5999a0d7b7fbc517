//! # Stockwise Backoffice CLI
//!
//! Operational entry point: applies migrations and prints read-only reports
//! as JSON on stdout. Logs go to stderr.
//!
//! ## Usage
//! ```bash
//! backoffice migrate
//! backoffice summary 2024-01-01 2024-01-31
//! backoffice low-stock
//! backoffice history 50
//! ```
//!
//! `STOCKWISE_DATABASE_PATH` (or `database_path` in `stockwise.toml`)
//! selects the database.

use std::env;

use anyhow::{bail, Context};
use serde::Serialize;
use stockwise_backoffice::commands::{inventory, product, report};
use stockwise_backoffice::logging::init_tracing;
use stockwise_backoffice::{AppConfig, Backoffice};
use stockwise_db::migrations::migration_status;
use tracing::info;

const USAGE: &str = "\
Usage: backoffice <COMMAND>

Commands:
  migrate                 Apply pending database migrations
  summary <FROM> <TO>     Financial summary, dates as YYYY-MM-DD (inclusive)
  low-stock               Products at or below their low-stock threshold
  history [LIMIT]         Latest inventory history entries (default: 50)
  help                    Show this help message";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MigrationReport {
    applied: usize,
    total: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");

    if matches!(command, "help" | "--help" | "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config);

    let app = Backoffice::open(config).await.context("opening database")?;
    info!(command, "Running backoffice command");

    match command {
        "migrate" => {
            app.db().run_migrations().await.context("applying migrations")?;
            let (total, applied) = migration_status(app.db().pool()).await?;
            print_json(&MigrationReport { applied, total })?;
        }
        "summary" => {
            let (Some(from), Some(to)) = (args.get(1), args.get(2)) else {
                bail!("summary needs <FROM> <TO>\n\n{}", USAGE);
            };
            let summary = report::get_financial_summary(&app, from, to).await?;
            let start = summary_date(from)?;
            let end = summary_date(to)?;
            print_json(&report::summary_view(&app, start, end, &summary))?;
        }
        "low-stock" => {
            print_json(&product::list_low_stock(&app).await)?;
        }
        "history" => {
            let limit = match args.get(1) {
                Some(raw) => raw.parse::<u32>().with_context(|| format!("invalid limit '{}'", raw))?,
                None => 50,
            };
            print_json(&inventory::list_inventory_history(&app, Some(limit)).await)?;
        }
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }

    app.close().await;
    Ok(())
}

fn summary_date(raw: &str) -> anyhow::Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("invalid date '{}'", raw))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
