//! diff::differ
//!
//! Computes the tree-shaped delta between two entity snapshots of the same
//! kind. Pure: no I/O, no mutation, deterministic output order.
//!
//! # Emission order
//!
//! - Term lists and statement lists: the union of keys in `after`'s order
//!   first (adds and changes), then the remaining `before`-only keys
//!   (removes)
//! - Feature sets: adds in canonical sorted order, then removes
//! - Forms/senses: matched by composite id; children present in both sides
//!   are diffed recursively, and an empty child diff emits nothing

use thiserror::Error;

use crate::core::lexeme::{Form, Lexeme, Sense};
use crate::core::statements::StatementList;
use crate::core::terms::{ItemReference, TermList};
use crate::diff::ops::{
    FeatureDiffOp, FeatureSetDiff, FormDiff, FormsDiffOp, ItemDiffOp, LexemeDiff, SenseDiff,
    SensesDiffOp, StatementDiffOp, StatementListDiff, TermDiffOp, TermListDiff,
};

/// Errors from diff computation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    /// Keyed collection diffing matches children by composite id, so both
    /// snapshots must carry assigned ids on every child.
    #[error("cannot diff a {0} that has no assigned id")]
    UnassignedChildId(&'static str),
}

/// Diff two term lists, keyed by language. Adds record the position the
/// entry holds in `after` so the patcher can splice it back into place.
pub fn diff_term_lists(before: &TermList, after: &TermList) -> TermListDiff {
    let mut ops = Vec::new();

    for (position, term) in after.iter().enumerate() {
        match before.text_for(term.language()) {
            None => ops.push(TermDiffOp::Add {
                language: term.language().to_string(),
                value: term.value().to_string(),
                position,
            }),
            Some(old) if old != term.value() => ops.push(TermDiffOp::Change {
                language: term.language().to_string(),
                from: old.to_string(),
                to: term.value().to_string(),
            }),
            Some(_) => {}
        }
    }

    for term in before {
        if !after.has_language(term.language()) {
            ops.push(TermDiffOp::Remove {
                language: term.language().to_string(),
                value: term.value().to_string(),
            });
        }
    }

    TermListDiff(ops)
}

/// Diff two statement lists, keyed by GUID.
///
/// A statement without a GUID (never saved) matches by structural equality
/// instead, each `before` entry pairing with at most one `after` entry, so
/// an unchanged unsaved statement emits nothing.
pub fn diff_statement_lists(before: &StatementList, after: &StatementList) -> StatementListDiff {
    let mut ops = Vec::new();
    let mut paired = vec![false; before.len()];

    for (position, statement) in after.iter().enumerate() {
        match statement.guid() {
            Some(guid) => match before.by_guid(guid) {
                None => ops.push(StatementDiffOp::Add {
                    statement: statement.clone(),
                    position,
                }),
                Some(old) if old != statement => ops.push(StatementDiffOp::Change {
                    from: old.clone(),
                    to: statement.clone(),
                }),
                Some(_) => {}
            },
            None => {
                let mut twin = None;
                for (i, candidate) in before.iter().enumerate() {
                    if !paired[i] && candidate.guid().is_none() && candidate == statement {
                        twin = Some(i);
                        break;
                    }
                }
                match twin {
                    Some(i) => paired[i] = true,
                    None => ops.push(StatementDiffOp::Add {
                        statement: statement.clone(),
                        position,
                    }),
                }
            }
        }
    }

    for (i, statement) in before.iter().enumerate() {
        let survives = match statement.guid() {
            Some(guid) => after.by_guid(guid).is_some(),
            None => paired[i],
        };
        if !survives {
            ops.push(StatementDiffOp::Remove {
                statement: statement.clone(),
            });
        }
    }

    StatementListDiff(ops)
}

/// Diff two feature sets by identity. Inputs are canonically sorted (the
/// entity model normalizes on write), so emission order is deterministic.
pub fn diff_feature_sets(before: &[ItemReference], after: &[ItemReference]) -> FeatureSetDiff {
    let mut ops = Vec::new();

    for item in after {
        if !before.contains(item) {
            ops.push(FeatureDiffOp::Add { item: item.clone() });
        }
    }
    for item in before {
        if !after.contains(item) {
            ops.push(FeatureDiffOp::Remove { item: item.clone() });
        }
    }

    FeatureSetDiff(ops)
}

fn diff_scalar(
    before: Option<&ItemReference>,
    after: Option<&ItemReference>,
) -> Option<ItemDiffOp> {
    match (before, after) {
        (None, Some(to)) => Some(ItemDiffOp::Set { to: to.clone() }),
        (Some(from), None) => Some(ItemDiffOp::Unset { from: from.clone() }),
        (Some(from), Some(to)) if from != to => Some(ItemDiffOp::Change {
            from: from.clone(),
            to: to.clone(),
        }),
        _ => None,
    }
}

/// Diff two Form snapshots field by field.
pub fn diff_form(before: &Form, after: &Form) -> FormDiff {
    FormDiff {
        representations: diff_term_lists(before.representations(), after.representations()),
        grammatical_features: diff_feature_sets(
            before.grammatical_features(),
            after.grammatical_features(),
        ),
        claims: diff_statement_lists(before.statements(), after.statements()),
    }
}

/// Diff two Sense snapshots field by field.
pub fn diff_sense(before: &Sense, after: &Sense) -> SenseDiff {
    SenseDiff {
        glosses: diff_term_lists(before.glosses(), after.glosses()),
        claims: diff_statement_lists(before.statements(), after.statements()),
    }
}

/// Diff two forms collections, keyed by composite id.
pub fn diff_forms_of(before: &[Form], after: &[Form]) -> Result<Vec<FormsDiffOp>, DiffError> {
    let mut ops = Vec::new();

    for form in after {
        let id = form
            .assigned_id()
            .map_err(|_| DiffError::UnassignedChildId("form"))?;
        match before.iter().find(|f| f.assigned_id() == Ok(id)) {
            None => ops.push(FormsDiffOp::Add { form: form.clone() }),
            Some(old) => {
                let child = diff_form(old, form);
                if !child.is_empty() {
                    ops.push(FormsDiffOp::Change {
                        id: id.clone(),
                        diff: child,
                    });
                }
            }
        }
    }

    for form in before {
        let id = form
            .assigned_id()
            .map_err(|_| DiffError::UnassignedChildId("form"))?;
        if !after.iter().any(|f| f.assigned_id() == Ok(id)) {
            ops.push(FormsDiffOp::Remove {
                id: id.clone(),
                form: form.clone(),
            });
        }
    }

    Ok(ops)
}

/// Diff two senses collections, keyed by composite id.
pub fn diff_senses_of(before: &[Sense], after: &[Sense]) -> Result<Vec<SensesDiffOp>, DiffError> {
    let mut ops = Vec::new();

    for sense in after {
        let id = sense
            .assigned_id()
            .map_err(|_| DiffError::UnassignedChildId("sense"))?;
        match before.iter().find(|s| s.assigned_id() == Ok(id)) {
            None => ops.push(SensesDiffOp::Add {
                sense: sense.clone(),
            }),
            Some(old) => {
                let child = diff_sense(old, sense);
                if !child.is_empty() {
                    ops.push(SensesDiffOp::Change {
                        id: id.clone(),
                        diff: child,
                    });
                }
            }
        }
    }

    for sense in before {
        let id = sense
            .assigned_id()
            .map_err(|_| DiffError::UnassignedChildId("sense"))?;
        if !after.iter().any(|s| s.assigned_id() == Ok(id)) {
            ops.push(SensesDiffOp::Remove {
                id: id.clone(),
                sense: sense.clone(),
            });
        }
    }

    Ok(ops)
}

/// Diff two Lexeme snapshots.
///
/// The overall diff is the composition of the lemma term-list diff, the
/// language/lexical-category scalar diffs, the root statement-list diff and
/// the keyed forms/senses diffs. Identity is never part of a diff.
pub fn diff_lexemes(before: &Lexeme, after: &Lexeme) -> Result<LexemeDiff, DiffError> {
    Ok(LexemeDiff {
        lemmas: diff_term_lists(before.lemmas(), after.lemmas()),
        language: diff_scalar(before.language(), after.language()),
        lexical_category: diff_scalar(before.lexical_category(), after.lexical_category()),
        claims: diff_statement_lists(before.statements(), after.statements()),
        forms: diff_forms_of(before.forms(), after.forms())?,
        senses: diff_senses_of(before.senses(), after.senses())?,
    })
}
