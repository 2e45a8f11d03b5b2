//! Triage CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success (ticket approved)
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Ticket escalated to the human queue
//! - 4: Classification failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const ESCALATED: u8 = 3;
    pub const CLASSIFICATION_FAILURE: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env().add_directive("warn".parse().unwrap());
    for target in ["triage_core", "triage_agents", "triage_cli"] {
        filter = filter.add_directive(format!("{}={}", target, level).parse().unwrap());
    }
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let msg = e.to_string().to_lowercase();

    if msg.contains("classification") {
        ExitCodes::CLASSIFICATION_FAILURE
    } else if msg.contains("category") || msg.contains("argument") || msg.contains("configured") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
