//! patch command - Apply a previously computed diff to a snapshot

use std::path::Path;

use anyhow::Result;

use super::{read_json, Output};
use crate::core::lexeme::Lexeme;
use crate::diff::ops::LexemeDiff;
use crate::diff::patcher::patch_lexeme;

/// Patch a snapshot and print the result.
pub fn run(entity: &Path, diff: &Path, out: &Output) -> Result<()> {
    let snapshot: Lexeme = read_json(entity)?;
    let diff: LexemeDiff = read_json(diff)?;

    let patched = patch_lexeme(&snapshot, &diff)?;
    out.emit(&patched)
}
