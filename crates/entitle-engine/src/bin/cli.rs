//! Entitle usage standalone binary.

use std::process::ExitCode;

use clap::Parser;
use entitle_engine::{UsageArgs, cli};

#[tokio::main]
async fn main() -> ExitCode {
    let args = UsageArgs::parse();

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
