//! merge command - Merge a source lexeme into a target lexeme

use std::path::Path;

use anyhow::Result;

use super::{read_json, Output};
use crate::core::lexeme::Lexeme;
use crate::merge::LexemeMerger;

/// Merge source into target and print the merged target.
pub fn run(source: &Path, target: &Path, out: &Output) -> Result<()> {
    let source: Lexeme = read_json(source)?;
    let mut target: Lexeme = read_json(target)?;

    LexemeMerger::with_default_strategy().merge(&source, &mut target)?;
    out.note(&format!(
        "merged {} into {}",
        source.id().map(ToString::to_string).unwrap_or_default(),
        target.id().map(ToString::to_string).unwrap_or_default(),
    ));
    out.emit(&target)
}
