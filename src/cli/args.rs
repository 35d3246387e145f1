//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--pretty`: Pretty-print JSON output
//! - `--quiet` / `-q`: Suppress diagnostics on stderr

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lexmerge - structural diff, patch and merge for lexicographical entities
#[derive(Parser, Debug)]
#[command(name = "lexmerge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Suppress diagnostics on stderr
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the structural diff between two lexeme snapshots
    #[command(
        after_help = "\
EXAMPLES:
    # Show what changed between two revisions
    lexmerge diff before.json after.json

    # Machine-readable, single line
    lexmerge diff before.json after.json > delta.json"
    )]
    Diff {
        /// The earlier snapshot
        before: PathBuf,
        /// The later snapshot
        after: PathBuf,
    },

    /// Apply a previously computed diff to a lexeme snapshot
    #[command(
        after_help = "\
EXAMPLES:
    lexmerge diff before.json after.json > delta.json
    lexmerge patch before.json delta.json   # prints the 'after' snapshot

A patch fails with a conflict if the snapshot has diverged from the
state the diff was computed against; re-fetch and re-diff instead of
retrying."
    )]
    Patch {
        /// The snapshot to patch
        entity: PathBuf,
        /// The diff to apply
        diff: PathBuf,
    },

    /// Merge a source lexeme into a target lexeme
    #[command(
        after_help = "\
EXAMPLES:
    lexmerge merge source.json target.json > merged-target.json

Preconditions (checked before anything is merged): distinct ids, same
language, same lexical category, no conflicting lemma values, no
statements referencing the other lexeme."
    )]
    Merge {
        /// The lexeme to merge from (retired afterwards)
        source: PathBuf,
        /// The lexeme to merge into
        target: PathBuf,
    },

    /// Apply change operations to an entity snapshot
    #[command(
        after_help = "\
EXAMPLES:
    lexmerge apply lexeme.json ops.json

ops.json holds one operation object or an array of them (applied in
order). Operations are validated before anything is applied; a failing
validation reports a field path and an error kind."
    )]
    Apply {
        /// The entity snapshot (a lexeme)
        entity: PathBuf,
        /// The change operations to apply
        ops: PathBuf,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
