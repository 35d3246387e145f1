//! cli
//!
//! Command-line interface layer for Lexmerge.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT contain domain logic; diff, patch, merge and change
//!   application all live in the library layers
//!
//! Snapshots cross this boundary as JSON files; results go to stdout as
//! JSON, diagnostics to stderr.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::Result;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    commands::dispatch(cli)
}
