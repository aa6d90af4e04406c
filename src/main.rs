//! Unified entitle CLI.
//!
//! - `entitle check` - Authorize one request and print the decision
//! - `entitle usage` - Inspect and maintain daily quota counters (SQL store)
//!
//! The usage subcommand is also available as the standalone `entitle-usage` binary.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Entitle unified CLI.
#[derive(Parser)]
#[command(
    name = "entitle",
    version,
    about = "Plan-tier feature gating and daily quota authorization",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize one request.
    #[command(name = "check")]
    Check(Box<entitle::cli::CheckArgs>),

    /// Manage daily quota counters (SQL backend).
    #[command(name = "usage")]
    Usage(entitle_engine::UsageArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check(args) => entitle::cli::run(*args).await,
        Commands::Usage(args) => entitle_engine::cli::run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
