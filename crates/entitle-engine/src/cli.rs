//! Usage table administration CLI.
//!
//! Usable as the standalone `entitle-usage` binary or as the `usage`
//! subcommand of the unified `entitle` CLI.
//!
//! # Usage
//!
//! ```bash
//! # Create the usage table
//! entitle-usage init -d sqlite:usage.db
//!
//! # Show a user's counters (all days, or one day)
//! entitle-usage show -d sqlite:usage.db -u user1
//! entitle-usage show -d sqlite:usage.db -u user1 --day 2026-05-01 -f json
//!
//! # Drop counters older than a day
//! entitle-usage prune -d sqlite:usage.db --before 2026-04-01
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use tabled::{Table, Tabled};
use time::{Date, OffsetDateTime};

use crate::sql::{SqlQuotaConfig, SqlQuotaStore, UsageRecord, format_day, parse_day};
use crate::store::utc_day;

/// Usage administration CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "entitle-usage",
    version,
    about = "Inspect and maintain daily quota counters"
)]
pub struct UsageArgs {
    #[command(subcommand)]
    pub command: UsageCommands,
}

/// Usage CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum UsageCommands {
    /// Initialize database schema.
    Init {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,
    },

    /// Show a user's counters.
    Show {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// User ID.
        #[arg(short, long)]
        user_id: String,

        /// Restrict to one UTC day (YYYY-MM-DD, or "today").
        #[arg(long)]
        day: Option<String>,

        /// Output format (table, json).
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Delete counters for days before the given one.
    Prune {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// First day to keep (YYYY-MM-DD).
        #[arg(long)]
        before: String,
    },
}

/// Counter row for display.
#[derive(Tabled, Serialize)]
struct UsageDisplay {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Used")]
    used: u32,
}

impl From<UsageRecord> for UsageDisplay {
    fn from(record: UsageRecord) -> Self {
        Self {
            day: format_day(record.day),
            kind: record.kind.to_string(),
            used: record.count,
        }
    }
}

/// Run the usage CLI with the given arguments.
pub async fn run(args: UsageArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        UsageCommands::Init { database } => {
            let store = connect(&database).await?;
            store.init_schema().await?;
            println!("Database schema initialized successfully.");
            Ok(())
        }
        UsageCommands::Show {
            database,
            user_id,
            day,
            format,
        } => {
            let day = day.as_deref().map(parse_day_arg).transpose()?;
            show_usage(&database, &user_id, day, &format).await
        }
        UsageCommands::Prune { database, before } => {
            let before = parse_day_arg(&before)?;
            if before > utc_day(OffsetDateTime::now_utc()) {
                return Err(format!(
                    "refusing to prune the current day: --before {} is in the future",
                    format_day(before)
                )
                .into());
            }
            let store = connect(&database).await?;
            let removed = store.prune_before(before).await?;
            println!("Removed {removed} counter(s) before {}.", format_day(before));
            Ok(())
        }
    }
}

async fn connect(url: &str) -> Result<SqlQuotaStore, Box<dyn std::error::Error>> {
    Ok(SqlQuotaStore::connect(SqlQuotaConfig::new(url).max_connections(1)).await?)
}

fn parse_day_arg(s: &str) -> Result<Date, Box<dyn std::error::Error>> {
    if s.eq_ignore_ascii_case("today") {
        return Ok(utc_day(OffsetDateTime::now_utc()));
    }
    parse_day(s).map_err(|e| format!("invalid day '{s}': {e}").into())
}

async fn show_usage(
    url: &str,
    user_id: &str,
    day: Option<Date>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = connect(url).await?;
    let rows: Vec<UsageDisplay> = store
        .usage_for_user(user_id, day)
        .await?
        .into_iter()
        .map(UsageDisplay::from)
        .collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        _ => {
            if rows.is_empty() {
                println!("No usage recorded for {user_id}.");
            } else {
                println!("{}", Table::new(rows));
            }
        }
    }
    Ok(())
}
