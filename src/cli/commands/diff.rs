//! diff command - Compute the structural diff between two lexeme snapshots

use std::path::Path;

use anyhow::Result;

use super::{read_json, Output};
use crate::core::lexeme::Lexeme;
use crate::diff::differ::diff_lexemes;

/// Diff two snapshots and print the delta.
pub fn run(before: &Path, after: &Path, out: &Output) -> Result<()> {
    let before: Lexeme = read_json(before)?;
    let after: Lexeme = read_json(after)?;

    let diff = diff_lexemes(&before, &after)?;
    if diff.is_empty() {
        out.note("snapshots are structurally equal");
    }
    out.emit(&diff)
}
