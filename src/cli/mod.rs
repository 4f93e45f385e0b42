//! CLI module for docrepo
//!
//! Provides command-line interface for:
//! - explain: show the store query a derived operation compiles to
//! - query: run a derived operation against a seeded in-memory store

mod args;
mod commands;
mod errors;
mod io;

pub use args::{CallOptions, Cli, Command};
pub use commands::{explain, query, run, run_command, run_explain, run_query, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
