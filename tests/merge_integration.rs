//! Integration tests for the merge engine.
//!
//! These exercise the full merge flow through the public API: multi-child
//! renumbering, custom statement strategies, and precondition symmetry.

use lexmerge::core::ids::{FormId, LexemeId, SenseId};
use lexmerge::core::lexeme::{Form, Lexeme, Sense};
use lexmerge::core::statements::{Statement, StatementList, StatementValue};
use lexmerge::core::terms::{ItemReference, Term, TermList};
use lexmerge::merge::{LexemeMerger, MergeError, StatementsMerger};

fn item(s: &str) -> ItemReference {
    ItemReference::new(s).unwrap()
}

fn term(lang: &str, text: &str) -> Term {
    Term::new(lang, text).unwrap()
}

/// A saved English-noun lexeme with no content.
fn saved(id: &str) -> Lexeme {
    let mut lexeme = Lexeme::blank();
    lexeme.assign_id(LexemeId::new(id).unwrap()).unwrap();
    lexeme.set_language(Some(item("Q1860")));
    lexeme.set_lexical_category(Some(item("Q1084")));
    lexeme
}

fn form(id: &str, lang: &str, text: &str) -> Form {
    Form::new(
        FormId::parse(id).unwrap(),
        TermList::from_terms([term(lang, text)]),
        vec![],
        StatementList::new(),
    )
}

fn sense(id: &str, lang: &str, gloss: &str) -> Sense {
    Sense::new(
        SenseId::parse(id).unwrap(),
        TermList::from_terms([term(lang, gloss)]),
        StatementList::new(),
    )
}

#[test]
fn source_children_continue_target_numbering() {
    let mut source = saved("L1");
    source.add_form(form("L1-F1", "en", "cats")).unwrap();
    source.add_form(form("L1-F2", "en", "cat's")).unwrap();
    source.add_sense(sense("L1-S1", "en", "a feline")).unwrap();

    let mut target = saved("L2");
    target.add_form(form("L2-F1", "en", "cat")).unwrap();
    // A removed form must not have its number reused.
    target.add_form(form("L2-F2", "en", "catte")).unwrap();
    target
        .remove_form(&FormId::parse("L2-F2").unwrap())
        .unwrap();

    LexemeMerger::with_default_strategy()
        .merge(&source, &mut target)
        .unwrap();

    let form_ids: Vec<String> = target
        .forms()
        .iter()
        .map(|f| f.assigned_id().unwrap().to_string())
        .collect();
    assert_eq!(form_ids, ["L2-F1", "L2-F3", "L2-F4"]);
    assert_eq!(
        target.senses()[0].assigned_id().unwrap().to_string(),
        "L2-S1"
    );
    assert_eq!(target.next_form_id(), 5);
    assert_eq!(target.next_sense_id(), 2);
}

#[test]
fn merged_lexeme_survives_serde_roundtrip() {
    let mut source = saved("L1");
    source.lemmas_mut().put(term("en-gb", "colour"));
    source.add_form(form("L1-F1", "en-gb", "colours")).unwrap();

    let mut target = saved("L2");
    target.lemmas_mut().put(term("en", "color"));
    target.add_form(form("L2-F1", "en", "colors")).unwrap();

    LexemeMerger::with_default_strategy()
        .merge(&source, &mut target)
        .unwrap();

    let json = serde_json::to_string(&target).unwrap();
    let parsed: Lexeme = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, target);
    assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
}

#[test]
fn preconditions_hold_in_both_directions() {
    let mut a = saved("L1");
    a.set_lexical_category(Some(item("Q24905")));
    let b = saved("L2");

    let merger = LexemeMerger::with_default_strategy();
    assert_eq!(
        merger.merge(&a, &mut b.clone()),
        Err(MergeError::DifferentLexicalCategories)
    );
    assert_eq!(
        merger.merge(&b, &mut a.clone()),
        Err(MergeError::DifferentLexicalCategories)
    );
}

#[test]
fn cross_reference_detected_from_either_side() {
    let merger = LexemeMerger::with_default_strategy();

    let mut source = saved("L1");
    source
        .statements_mut()
        .push(Statement::new(item("P5191"), StatementValue::Entity("L2".into())).with_guid("L1$a"));
    let target = saved("L2");
    assert_eq!(
        merger.merge(&source, &mut target.clone()),
        Err(MergeError::CrossReferencing)
    );

    // The reverse direction: the target points at the source.
    let source = saved("L1");
    let mut target = saved("L2");
    target
        .statements_mut()
        .push(Statement::new(item("P5191"), StatementValue::Entity("L1".into())).with_guid("L2$a"));
    assert_eq!(
        merger.merge(&source, &mut target),
        Err(MergeError::CrossReferencing)
    );
}

#[test]
fn form_reference_to_partner_also_blocks_merge() {
    let mut source = saved("L1");
    let mut f = form("L1-F1", "en", "cats");
    f.statements_mut()
        .push(Statement::new(item("P5191"), StatementValue::Entity("L2".into())).with_guid("L1-F1$a"));
    source.add_form(f).unwrap();
    let mut target = saved("L2");

    assert_eq!(
        LexemeMerger::with_default_strategy().merge(&source, &mut target),
        Err(MergeError::CrossReferencing)
    );
}

/// A strategy that refuses to merge statements at all.
struct RefusingMerger;

impl StatementsMerger for RefusingMerger {
    fn merge(
        &self,
        _source: &StatementList,
        _target_owner: &LexemeId,
        _target: &mut StatementList,
    ) -> Result<(), MergeError> {
        Err(MergeError::ModificationFailed("statements frozen".into()))
    }
}

#[test]
fn failing_statement_strategy_leaves_target_untouched() {
    let mut source = saved("L1");
    source.lemmas_mut().put(term("de", "Katze"));
    source
        .statements_mut()
        .push(Statement::new(item("P31"), StatementValue::Text("x".into())).with_guid("L1$a"));

    let mut target = saved("L2");
    target.lemmas_mut().put(term("en", "cat"));
    let snapshot = target.clone();

    let merger = LexemeMerger::new(Box::new(RefusingMerger));
    assert_eq!(
        merger.merge(&source, &mut target),
        Err(MergeError::ModificationFailed("statements frozen".into()))
    );
    // The lemma merge had already run on the scratch copy; none of it
    // may leak into the target.
    assert_eq!(target, snapshot);
}

#[test]
fn shared_lemma_values_are_not_conflicts() {
    let mut source = saved("L1");
    source.lemmas_mut().put(term("en", "cat"));
    source.lemmas_mut().put(term("de", "Katze"));

    let mut target = saved("L2");
    target.lemmas_mut().put(term("en", "cat"));

    LexemeMerger::with_default_strategy()
        .merge(&source, &mut target)
        .unwrap();
    assert_eq!(target.lemmas().len(), 2);
    assert_eq!(target.lemmas().text_for("en"), Some("cat"));
    assert_eq!(target.lemmas().text_for("de"), Some("Katze"));
}
