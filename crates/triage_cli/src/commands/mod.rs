//! CLI command definitions.

use clap::{Parser, Subcommand};

pub mod resolve;

/// triage - support ticket resolution pipeline
#[derive(Parser)]
#[command(name = "triage")]
#[command(version, about = "triage - LLM-backed support ticket resolution pipeline")]
#[command(long_about = r#"
triage routes a support ticket through classification, knowledge retrieval,
draft generation, and automated review, retrying with reviewer feedback up to
a fixed budget and escalating to a human queue on repeated rejection.

EXIT CODES:
  0 - Success (ticket approved)
  1 - General error
  2 - Invalid arguments
  3 - Ticket escalated to the human queue
  4 - Classification failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve one ticket and print the final state as JSON
    Resolve(resolve::ResolveArgs),
}
