//! apply command - Apply change operations to an entity snapshot

use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use super::{read_json, Output};
use crate::changeop::{ChangeOp, Entity};
use crate::core::lexeme::Lexeme;

/// One operation or a list applied in order.
#[derive(Deserialize)]
#[serde(untagged)]
enum OpsFile {
    One(Box<ChangeOp>),
    Many(Vec<ChangeOp>),
}

/// Apply change operations to a lexeme and print the result.
pub fn run(entity: &Path, ops: &Path, out: &Output) -> Result<()> {
    let lexeme: Lexeme = read_json(entity)?;
    let op = match read_json::<OpsFile>(ops)? {
        OpsFile::One(op) => *op,
        OpsFile::Many(ops) => ChangeOp::Composite { ops },
    };

    let applied = op.apply(&Entity::Lexeme(lexeme))?;
    out.note(&format!("actions: {}", op.actions().join(", ")));
    match applied {
        Entity::Lexeme(lexeme) => out.emit(&lexeme),
        other => anyhow::bail!("expected a lexeme after apply, got a {}", other.kind()),
    }
}
