//! CLI argument definitions using clap
//!
//! Commands:
//! - docrepo explain --config <path> --entity <name> --method <name> [--args <json>]
//! - docrepo query --config <path> --entity <name> --method <name> [--args <json>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// docrepo - derived queries over a partitioned document store
#[derive(Parser, Debug)]
#[command(name = "docrepo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the store query a derived operation compiles to
    Explain(CallOptions),

    /// Run a derived operation against the seeded in-memory store
    Query(CallOptions),
}

/// Flags shared by every command
#[derive(Args, Debug, Clone)]
pub struct CallOptions {
    /// Path to configuration file
    #[arg(long, default_value = "./docrepo.json")]
    pub config: PathBuf,

    /// Entity name as declared in the configuration
    #[arg(long)]
    pub entity: String,

    /// Operation name, e.g. findByCityAndStreet
    #[arg(long)]
    pub method: String,

    /// Positional arguments as a JSON array
    #[arg(long, default_value = "[]")]
    pub args: String,

    /// Page size
    #[arg(long)]
    pub page_size: Option<i64>,

    /// Base64 continuation token from a previous page
    #[arg(long)]
    pub continuation: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
