//! diff::patcher
//!
//! Replays a previously computed delta onto a snapshot, producing a new
//! snapshot. Fields are patched in the same order the differ emits them.
//! Within a term or statement list, removes are applied before adds so
//! that each add lands at the position the entry held in the `after`
//! snapshot.
//!
//! # Conflict policy
//!
//! The patcher assumes the snapshot it is given is the `before` state the
//! diff was computed against, or one where the affected entries are still
//! absent/present as expected. Every remove and change carries the expected
//! old value and requires an exact match. Adds require the key to be absent,
//! except that re-adding an identical value is a no-op, which keeps
//! value-preserving adds idempotent. Anything else fails with
//! [`PatchError::Conflict`], and the caller must re-fetch and recompute the
//! diff rather than retry blindly.

use thiserror::Error;

use crate::core::lexeme::{Form, Lexeme, Sense};
use crate::core::statements::StatementList;
use crate::core::terms::{ItemReference, Term, TermError, TermList};
use crate::diff::ops::{
    FeatureDiffOp, FeatureSetDiff, FormDiff, FormsDiffOp, ItemDiffOp, LexemeDiff, SenseDiff,
    SensesDiffOp, StatementDiffOp, StatementListDiff, TermDiffOp, TermListDiff,
};

/// Errors from patch application.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// The snapshot has diverged from the diff's expected `before` state.
    #[error("patch conflict: {0}")]
    Conflict(String),

    /// A child add operation carried no assigned id.
    #[error("patched child has no assigned id")]
    UnassignedChildId,

    #[error(transparent)]
    InvalidTerm(#[from] TermError),
}

fn conflict(detail: impl Into<String>) -> PatchError {
    PatchError::Conflict(detail.into())
}

fn patch_term_list(list: &mut TermList, diff: &TermListDiff) -> Result<(), PatchError> {
    // Removes first, so positional adds splice into the surviving entries
    // exactly where the `after` snapshot had them.
    for op in &diff.0 {
        if let TermDiffOp::Remove { language, value } = op {
            match list.text_for(language) {
                Some(current) if current == value => {
                    list.remove(language);
                }
                Some(current) => {
                    return Err(conflict(format!(
                        "term remove for '{language}' expects '{value}', found '{current}'"
                    )))
                }
                None => {
                    return Err(conflict(format!(
                        "term remove for '{language}' targets an absent term"
                    )))
                }
            }
        }
    }

    for op in &diff.0 {
        match op {
            TermDiffOp::Add {
                language,
                value,
                position,
            } => match list.text_for(language) {
                None => list.insert(*position, Term::new(language.clone(), value.clone())?),
                Some(current) if current == value => {}
                Some(current) => {
                    return Err(conflict(format!(
                        "term add for '{language}' expects absence, found '{current}'"
                    )))
                }
            },
            TermDiffOp::Change { language, from, to } => match list.text_for(language) {
                Some(current) if current == from => {
                    list.put(Term::new(language.clone(), to.clone())?)
                }
                Some(current) => {
                    return Err(conflict(format!(
                        "term change for '{language}' expects '{from}', found '{current}'"
                    )))
                }
                None => {
                    return Err(conflict(format!(
                        "term change for '{language}' targets an absent term"
                    )))
                }
            },
            TermDiffOp::Remove { .. } => {}
        }
    }
    Ok(())
}

fn patch_statement_list(
    list: &mut StatementList,
    diff: &StatementListDiff,
) -> Result<(), PatchError> {
    // Removes first, so positional adds splice into the surviving entries
    // exactly where the `after` snapshot had them.
    for op in &diff.0 {
        if let StatementDiffOp::Remove { statement } = op {
            match statement.guid() {
                Some(guid) => match list.by_guid(guid) {
                    Some(current) if current == statement => {
                        list.remove_by_guid(guid);
                    }
                    Some(_) => {
                        return Err(conflict(format!(
                            "statement remove for '{guid}' expects a different value"
                        )))
                    }
                    None => {
                        return Err(conflict(format!(
                            "statement remove for '{guid}' targets an absent statement"
                        )))
                    }
                },
                // No guid: match by full equality.
                None => {
                    if !list.remove_first_equal(statement) {
                        return Err(conflict(
                            "statement remove targets an absent unidentified statement",
                        ));
                    }
                }
            }
        }
    }

    for op in &diff.0 {
        match op {
            StatementDiffOp::Add {
                statement,
                position,
            } => {
                let existing = match statement.guid() {
                    Some(guid) => list.by_guid(guid),
                    None => list.iter().find(|s| *s == statement),
                };
                match existing {
                    None => list.insert(*position, statement.clone()),
                    Some(current) if current == statement => {}
                    Some(_) => {
                        return Err(conflict(format!(
                            "statement add for '{}' expects absence",
                            statement.guid().unwrap_or("<no guid>")
                        )))
                    }
                }
            }
            StatementDiffOp::Change { from, to } => {
                let guid = from
                    .guid()
                    .ok_or_else(|| conflict("statement change without a guid cannot be matched"))?;
                match list.by_guid(guid) {
                    Some(current) if current == from => {}
                    Some(_) => {
                        return Err(conflict(format!(
                            "statement change for '{guid}' expects a different value"
                        )))
                    }
                    None => {
                        return Err(conflict(format!(
                            "statement change for '{guid}' targets an absent statement"
                        )))
                    }
                }
                // The replacement may carry a different GUID; it takes over
                // the matched statement's slot.
                if list.replace_at_guid(guid, to.clone()).is_none() {
                    return Err(conflict(format!(
                        "statement change for '{guid}' targets an absent statement"
                    )));
                }
            }
            StatementDiffOp::Remove { .. } => {}
        }
    }
    Ok(())
}

fn patch_feature_set(form: &mut Form, diff: &FeatureSetDiff) -> Result<(), PatchError> {
    for op in &diff.0 {
        match op {
            // Set add is idempotent by definition.
            FeatureDiffOp::Add { item } => form.add_grammatical_feature(item.clone()),
            FeatureDiffOp::Remove { item } => {
                if !form.remove_grammatical_feature(item) {
                    return Err(conflict(format!(
                        "feature remove for '{item}' targets an absent feature"
                    )));
                }
            }
        }
    }
    Ok(())
}

fn patch_scalar(
    current: Option<&ItemReference>,
    op: &ItemDiffOp,
    field: &str,
) -> Result<Option<ItemReference>, PatchError> {
    match op {
        ItemDiffOp::Set { to } => match current {
            None => Ok(Some(to.clone())),
            Some(v) if v == to => Ok(Some(to.clone())),
            Some(v) => Err(conflict(format!(
                "{field} set expects absence, found '{v}'"
            ))),
        },
        ItemDiffOp::Unset { from } => match current {
            Some(v) if v == from => Ok(None),
            _ => Err(conflict(format!("{field} unset expects '{from}'"))),
        },
        ItemDiffOp::Change { from, to } => match current {
            Some(v) if v == from => Ok(Some(to.clone())),
            _ => Err(conflict(format!("{field} change expects '{from}'"))),
        },
    }
}

/// Apply a Form diff, producing a new snapshot.
pub fn patch_form(form: &Form, diff: &FormDiff) -> Result<Form, PatchError> {
    let mut patched = form.clone();
    patch_term_list(patched.representations_mut(), &diff.representations)?;
    patch_feature_set(&mut patched, &diff.grammatical_features)?;
    patch_statement_list(patched.statements_mut(), &diff.claims)?;
    Ok(patched)
}

/// Apply a Sense diff, producing a new snapshot.
pub fn patch_sense(sense: &Sense, diff: &SenseDiff) -> Result<Sense, PatchError> {
    let mut patched = sense.clone();
    patch_term_list(patched.glosses_mut(), &diff.glosses)?;
    patch_statement_list(patched.statements_mut(), &diff.claims)?;
    Ok(patched)
}

fn patch_forms(lexeme: &mut Lexeme, ops: &[FormsDiffOp]) -> Result<(), PatchError> {
    for op in ops {
        match op {
            FormsDiffOp::Add { form } => {
                let id = form
                    .assigned_id()
                    .map_err(|_| PatchError::UnassignedChildId)?
                    .clone();
                match lexeme.form(&id) {
                    None => lexeme
                        .add_form(form.clone())
                        .map_err(|e| conflict(format!("form add for '{id}': {e}")))?,
                    Some(existing) if existing == form => {}
                    Some(_) => {
                        return Err(conflict(format!(
                            "form add for '{id}' expects absence"
                        )))
                    }
                }
            }
            FormsDiffOp::Remove { id, form } => match lexeme.form(id) {
                Some(existing) if existing == form => {
                    lexeme.remove_form(id);
                }
                Some(_) => {
                    return Err(conflict(format!(
                        "form remove for '{id}' expects a different value"
                    )))
                }
                None => {
                    return Err(conflict(format!(
                        "form remove for '{id}' targets an absent form"
                    )))
                }
            },
            FormsDiffOp::Change { id, diff } => {
                let existing = lexeme
                    .form(id)
                    .ok_or_else(|| conflict(format!("form change for '{id}' targets an absent form")))?;
                let patched = patch_form(existing, diff)?;
                *lexeme
                    .form_mut(id)
                    .ok_or_else(|| conflict(format!("form change for '{id}' targets an absent form")))? =
                    patched;
            }
        }
    }
    Ok(())
}

fn patch_senses(lexeme: &mut Lexeme, ops: &[SensesDiffOp]) -> Result<(), PatchError> {
    for op in ops {
        match op {
            SensesDiffOp::Add { sense } => {
                let id = sense
                    .assigned_id()
                    .map_err(|_| PatchError::UnassignedChildId)?
                    .clone();
                match lexeme.sense(&id) {
                    None => lexeme
                        .add_sense(sense.clone())
                        .map_err(|e| conflict(format!("sense add for '{id}': {e}")))?,
                    Some(existing) if existing == sense => {}
                    Some(_) => {
                        return Err(conflict(format!(
                            "sense add for '{id}' expects absence"
                        )))
                    }
                }
            }
            SensesDiffOp::Remove { id, sense } => match lexeme.sense(id) {
                Some(existing) if existing == sense => {
                    lexeme.remove_sense(id);
                }
                Some(_) => {
                    return Err(conflict(format!(
                        "sense remove for '{id}' expects a different value"
                    )))
                }
                None => {
                    return Err(conflict(format!(
                        "sense remove for '{id}' targets an absent sense"
                    )))
                }
            },
            SensesDiffOp::Change { id, diff } => {
                let existing = lexeme
                    .sense(id)
                    .ok_or_else(|| conflict(format!("sense change for '{id}' targets an absent sense")))?;
                let patched = patch_sense(existing, diff)?;
                *lexeme
                    .sense_mut(id)
                    .ok_or_else(|| conflict(format!("sense change for '{id}' targets an absent sense")))? =
                    patched;
            }
        }
    }
    Ok(())
}

/// Apply a Lexeme diff, producing a new snapshot.
///
/// Fields are patched in differ emission order: lemmas, language, lexical
/// category, root statements, forms, senses. The input snapshot is never
/// modified, even on failure.
pub fn patch_lexeme(lexeme: &Lexeme, diff: &LexemeDiff) -> Result<Lexeme, PatchError> {
    let mut patched = lexeme.clone();

    patch_term_list(patched.lemmas_mut(), &diff.lemmas)?;
    if let Some(op) = &diff.language {
        let next = patch_scalar(patched.language(), op, "language")?;
        patched.set_language(next);
    }
    if let Some(op) = &diff.lexical_category {
        let next = patch_scalar(patched.lexical_category(), op, "lexical category")?;
        patched.set_lexical_category(next);
    }
    patch_statement_list(patched.statements_mut(), &diff.claims)?;
    patch_forms(&mut patched, &diff.forms)?;
    patch_senses(&mut patched, &diff.senses)?;

    Ok(patched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{FormId, LexemeId};
    use crate::core::statements::{Statement, StatementValue};
    use crate::diff::differ::{diff_forms_of, diff_lexemes, diff_statement_lists, diff_term_lists};

    fn term(lang: &str, text: &str) -> Term {
        Term::new(lang, text).unwrap()
    }

    fn item(s: &str) -> ItemReference {
        ItemReference::new(s).unwrap()
    }

    fn saved_lexeme(id: &str) -> Lexeme {
        let mut lexeme = Lexeme::blank();
        lexeme.assign_id(LexemeId::new(id).unwrap()).unwrap();
        lexeme
    }

    #[test]
    fn patch_inverts_diff() {
        let mut before = saved_lexeme("L7");
        before.lemmas_mut().put(term("en", "cat"));
        before.set_language(Some(item("Q1860")));

        let mut after = before.clone();
        after.lemmas_mut().put(term("de", "Katze"));
        after.set_lexical_category(Some(item("Q1084")));
        let mut form = Form::blank();
        form.representations_mut().put(term("en", "cats"));
        after.add_form(form).unwrap();
        after.assign_child_ids().unwrap();

        let diff = diff_lexemes(&before, &after).unwrap();
        let patched = patch_lexeme(&before, &diff).unwrap();
        assert_eq!(patched, after);
    }

    #[test]
    fn identical_add_is_noop() {
        let mut list = TermList::from_terms([term("en", "cat")]);
        let diff = TermListDiff(vec![TermDiffOp::Add {
            language: "en".into(),
            value: "cat".into(),
            position: 0,
        }]);
        patch_term_list(&mut list, &diff).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn conflicting_add_fails() {
        let mut list = TermList::from_terms([term("en", "dog")]);
        let diff = TermListDiff(vec![TermDiffOp::Add {
            language: "en".into(),
            value: "cat".into(),
            position: 0,
        }]);
        assert!(matches!(
            patch_term_list(&mut list, &diff),
            Err(PatchError::Conflict(_))
        ));
    }

    #[test]
    fn change_requires_exact_old_value() {
        let before = TermList::from_terms([term("en", "cat")]);
        let after = TermList::from_terms([term("en", "dog")]);
        let diff = diff_term_lists(&before, &after);

        let mut first = before.clone();
        patch_term_list(&mut first, &diff).unwrap();
        assert_eq!(first.text_for("en"), Some("dog"));

        // Second application no longer matches the expected old value.
        assert!(matches!(
            patch_term_list(&mut first, &diff),
            Err(PatchError::Conflict(_))
        ));
    }

    #[test]
    fn remove_of_absent_form_conflicts() {
        let before = saved_lexeme("L7");
        let form = Form::new(
            FormId::parse("L7-F1").unwrap(),
            TermList::from_terms([term("en", "cats")]),
            vec![],
            crate::core::statements::StatementList::new(),
        );
        let diff = LexemeDiff {
            forms: vec![FormsDiffOp::Remove {
                id: FormId::parse("L7-F1").unwrap(),
                form,
            }],
            ..Default::default()
        };
        assert!(matches!(
            patch_lexeme(&before, &diff),
            Err(PatchError::Conflict(_))
        ));
    }

    #[test]
    fn add_of_existing_different_form_conflicts() {
        let id = FormId::parse("L7-F1").unwrap();
        let existing = Form::new(
            id.clone(),
            TermList::from_terms([term("en", "cats")]),
            vec![],
            crate::core::statements::StatementList::new(),
        );
        let incoming = Form::new(
            id,
            TermList::from_terms([term("en", "cat")]),
            vec![],
            crate::core::statements::StatementList::new(),
        );

        let mut lexeme = saved_lexeme("L7");
        lexeme.add_form(existing).unwrap();

        let diff = LexemeDiff {
            forms: vec![FormsDiffOp::Add { form: incoming }],
            ..Default::default()
        };
        assert!(matches!(
            patch_lexeme(&lexeme, &diff),
            Err(PatchError::Conflict(_))
        ));
    }

    #[test]
    fn failed_patch_leaves_input_untouched() {
        let mut before = saved_lexeme("L7");
        before.lemmas_mut().put(term("en", "dog"));
        let snapshot = before.clone();

        let diff = LexemeDiff {
            lemmas: TermListDiff(vec![TermDiffOp::Add {
                language: "en".into(),
                value: "cat".into(),
                position: 0,
            }]),
            ..Default::default()
        };
        assert!(patch_lexeme(&before, &diff).is_err());
        assert_eq!(before, snapshot);
    }

    #[test]
    fn patched_term_order_matches_after_snapshot() {
        let mut before = saved_lexeme("L7");
        before.lemmas_mut().put(term("pt", "gato"));

        let mut after = saved_lexeme("L7");
        after.lemmas_mut().put(term("nl", "kat"));
        after.lemmas_mut().put(term("pt", "gato"));

        let diff = diff_lexemes(&before, &after).unwrap();
        let patched = patch_lexeme(&before, &diff).unwrap();
        assert_eq!(patched, after);
        let langs: Vec<_> = patched.lemmas().languages().collect();
        assert_eq!(langs, vec!["nl", "pt"]);
    }

    #[test]
    fn removes_apply_before_positional_adds() {
        let before = TermList::from_terms([term("aa", "1"), term("bb", "2")]);
        let after = TermList::from_terms([term("bb", "2"), term("cc", "3")]);

        let diff = diff_term_lists(&before, &after);
        let mut patched = before.clone();
        patch_term_list(&mut patched, &diff).unwrap();
        assert_eq!(patched, after);
    }

    #[test]
    fn added_statement_lands_at_its_position() {
        let head = Statement::new(item("P1"), StatementValue::Text("a".into())).with_guid("L7$a");
        let tail = Statement::new(item("P2"), StatementValue::Text("b".into())).with_guid("L7$b");

        let before = StatementList::from_statements([tail.clone()]);
        let after = StatementList::from_statements([head, tail]);

        let diff = diff_statement_lists(&before, &after);
        let mut patched = before.clone();
        patch_statement_list(&mut patched, &diff).unwrap();
        assert_eq!(patched, after);
    }

    #[test]
    fn self_patch_keeps_unsaved_statements() {
        let mut lexeme = saved_lexeme("L7");
        lexeme
            .statements_mut()
            .push(Statement::new(item("P5"), StatementValue::Text("x".into())));

        let diff = diff_lexemes(&lexeme, &lexeme).unwrap();
        assert!(diff.is_empty());
        let patched = patch_lexeme(&lexeme, &diff).unwrap();
        assert_eq!(patched, lexeme);
    }

    #[test]
    fn statement_change_may_rename_the_guid() {
        let from = Statement::new(item("P5"), StatementValue::Text("a".into())).with_guid("L7$a");
        let to = Statement::new(item("P5"), StatementValue::Text("b".into())).with_guid("L7$b");

        let mut list = StatementList::from_statements([from.clone()]);
        let diff = StatementListDiff(vec![StatementDiffOp::Change {
            from,
            to: to.clone(),
        }]);
        patch_statement_list(&mut list, &diff).unwrap();
        assert_eq!(list.by_guid("L7$a"), None);
        assert_eq!(list.by_guid("L7$b"), Some(&to));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn statement_change_applies_by_guid() {
        let guid = "L7$stmt-1";
        let from = Statement::new(item("P5"), StatementValue::Text("a".into())).with_guid(guid);
        let to = Statement::new(item("P5"), StatementValue::Text("b".into())).with_guid(guid);

        let mut list = StatementList::from_statements([from.clone()]);
        let diff = StatementListDiff(vec![StatementDiffOp::Change {
            from,
            to: to.clone(),
        }]);
        patch_statement_list(&mut list, &diff).unwrap();
        assert_eq!(list.by_guid(guid), Some(&to));
    }

    #[test]
    fn forms_diff_patch_roundtrip_with_nested_statements() {
        let parent = LexemeId::new("L7").unwrap();
        let mut before_form = Form::new(
            FormId::new(parent.clone(), 1).unwrap(),
            TermList::from_terms([term("en", "cats")]),
            vec![item("Q146")],
            StatementList::new(),
        );
        before_form
            .statements_mut()
            .push(Statement::new(item("P5"), StatementValue::Text("x".into())).with_guid("L7-F1$s"));

        let mut after_form = before_form.clone();
        after_form.set_grammatical_features(vec![item("Q100")]);
        after_form.statements_mut().remove_by_guid("L7-F1$s");

        let mut before = saved_lexeme("L7");
        before.add_form(before_form.clone()).unwrap();
        let mut after = saved_lexeme("L7");
        after.add_form(after_form.clone()).unwrap();

        let ops = diff_forms_of(before.forms(), after.forms()).unwrap();
        let mut patched = before.clone();
        patch_forms(&mut patched, &ops).unwrap();
        assert_eq!(patched, after);
    }
}
