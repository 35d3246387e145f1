//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler reads its JSON inputs, calls into the library, and prints
//! the result to stdout. Handlers never embed diff/merge semantics.

mod apply;
mod completion;
mod diff;
mod merge;
mod patch;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cli::args::{Cli, Command};

/// Dispatch a parsed command line to its handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let out = Output {
        pretty: cli.pretty,
        quiet: cli.quiet,
    };
    match cli.command {
        Command::Diff { before, after } => diff::run(&before, &after, &out),
        Command::Patch { entity, diff } => patch::run(&entity, &diff, &out),
        Command::Merge { source, target } => merge::run(&source, &target, &out),
        Command::Apply { entity, ops } => apply::run(&entity, &ops, &out),
        Command::Completion { shell } => completion::run(shell),
    }
}

/// Output settings shared by all handlers.
pub(crate) struct Output {
    pretty: bool,
    quiet: bool,
}

impl Output {
    /// Print a value as JSON on stdout.
    pub(crate) fn emit<T: Serialize>(&self, value: &T) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{json}");
        Ok(())
    }

    /// Print a diagnostic line on stderr unless quiet.
    pub(crate) fn note(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }
}

/// Read and deserialize a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("cannot parse {}", path.display()))
}
