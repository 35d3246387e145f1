//! Property-based tests for the core domain types and the diff/patch
//! engine.
//!
//! These tests use proptest to verify the structural laws hold across
//! randomly generated lexemes: identifier round-trips, self-diff
//! emptiness, the patch inverse law, and add idempotence.

use std::collections::BTreeMap;

use proptest::prelude::*;

use lexmerge::core::ids::{FormId, LexemeId, SenseId};
use lexmerge::core::lexeme::{Form, Lexeme, Sense};
use lexmerge::core::statements::{Statement, StatementList, StatementValue};
use lexmerge::core::terms::{ItemReference, Term, TermList};
use lexmerge::diff::{diff_lexemes, patch_lexeme};

/// Strategy for valid lexeme id numbers.
fn lexeme_id() -> impl Strategy<Value = LexemeId> {
    (1u64..1_000_000).prop_map(|n| LexemeId::from_number(n).unwrap())
}

/// Strategy for a small pool of language codes, so generated snapshots
/// overlap often enough to exercise change and remove ops.
fn language_code() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["en", "de", "fr", "nl", "pt", "cs"]).prop_map(str::to_string)
}

/// Strategy for valid item references (`Q<number>`).
fn item_ref() -> impl Strategy<Value = ItemReference> {
    (1u32..500).prop_map(|n| ItemReference::new(format!("Q{n}")).unwrap())
}

/// Strategy for a term list with unique languages.
fn term_list() -> impl Strategy<Value = TermList> {
    prop::collection::btree_map(language_code(), "[a-z]{1,12}", 0..4).prop_map(|terms| {
        TermList::from_terms(
            terms
                .into_iter()
                .map(|(language, text)| Term::new(language, text).unwrap()),
        )
    })
}

/// Strategy for statements keyed by a deterministic GUID suffix, so two
/// snapshots of the same lexeme can share GUIDs, plus at most one statement
/// that was never saved and carries no GUID.
fn statements_for(owner: String) -> impl Strategy<Value = StatementList> {
    let saved = prop::collection::btree_map(0u8..4, (item_ref(), "[a-z]{1,8}"), 0..3);
    let unsaved = prop::option::of((item_ref(), "[a-z]{1,8}"));
    (saved, unsaved).prop_map(move |(entries, unsaved)| {
        let mut list =
            StatementList::from_statements(entries.into_iter().map(|(k, (property, text))| {
                Statement::new(property, StatementValue::Text(text))
                    .with_guid(format!("{owner}${k}"))
            }));
        if let Some((property, text)) = unsaved {
            list.push(Statement::new(property, StatementValue::Text(text)));
        }
        list
    })
}

/// Strategy for a saved lexeme with the given id: lemmas, scalar items,
/// root statements, and up to three forms and senses with assigned ids.
fn lexeme_with_id(id: LexemeId) -> impl Strategy<Value = Lexeme> {
    let forms = prop::collection::btree_map(
        1u32..4,
        (term_list(), prop::collection::vec(item_ref(), 0..3)),
        0..3,
    );
    let senses = prop::collection::btree_map(1u32..4, term_list(), 0..3);
    (
        term_list(),
        prop::option::of(item_ref()),
        prop::option::of(item_ref()),
        statements_for(id.to_string()),
        forms,
        senses,
    )
        .prop_map(
            move |(lemmas, language, category, statements, forms, senses)| {
                let mut lexeme = Lexeme::blank();
                lexeme.assign_id(id.clone()).unwrap();
                *lexeme.lemmas_mut() = lemmas;
                lexeme.set_language(language);
                lexeme.set_lexical_category(category);
                *lexeme.statements_mut() = statements;
                for (local, (representations, features)) in forms {
                    let form_id = FormId::new(id.clone(), local).unwrap();
                    lexeme
                        .add_form(Form::new(
                            form_id,
                            representations,
                            features,
                            StatementList::new(),
                        ))
                        .unwrap();
                }
                for (local, glosses) in senses {
                    let sense_id = SenseId::new(id.clone(), local).unwrap();
                    lexeme
                        .add_sense(Sense::new(sense_id, glosses, StatementList::new()))
                        .unwrap();
                }
                lexeme
            },
        )
}

/// Strategy for an arbitrary saved lexeme.
fn lexeme() -> impl Strategy<Value = Lexeme> {
    lexeme_id().prop_flat_map(lexeme_with_id)
}

/// Strategy for two snapshots of the same lexeme.
fn lexeme_pair() -> impl Strategy<Value = (Lexeme, Lexeme)> {
    lexeme_id().prop_flat_map(|id| (lexeme_with_id(id.clone()), lexeme_with_id(id)))
}

proptest! {
    /// Any valid lexeme id round-trips through serde.
    #[test]
    fn lexeme_id_serde_roundtrip(id in lexeme_id()) {
        let json = serde_json::to_string(&id).unwrap();
        let parsed: LexemeId = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(id, parsed);
    }

    /// Any composable form id parses back to the same parts.
    #[test]
    fn form_id_parse_roundtrip(parent in lexeme_id(), local in 1u32..100_000) {
        let id = FormId::new(parent.clone(), local).unwrap();
        let parsed = FormId::parse(&id.serialization()).unwrap();
        prop_assert_eq!(parsed.parent(), &parent);
        prop_assert_eq!(parsed.local_id(), local);
    }

    /// Any lexeme survives a serde round-trip, and re-serializing the
    /// parsed value reproduces the exact same bytes.
    #[test]
    fn lexeme_serde_roundtrip_is_byte_stable(lexeme in lexeme()) {
        let json = serde_json::to_string(&lexeme).unwrap();
        let parsed: Lexeme = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&parsed, &lexeme);
        prop_assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
    }

    /// Diffing a snapshot against itself yields an empty diff.
    #[test]
    fn self_diff_is_empty(lexeme in lexeme()) {
        let diff = diff_lexemes(&lexeme, &lexeme).unwrap();
        prop_assert!(diff.is_empty());
    }

    /// Patching the before snapshot with its diff reproduces the after
    /// snapshot.
    #[test]
    fn patch_inverts_diff((before, after) in lexeme_pair()) {
        let diff = diff_lexemes(&before, &after).unwrap();
        let patched = patch_lexeme(&before, &diff).unwrap();
        prop_assert_eq!(patched, after);
    }

    /// A pure-add diff (computed against an empty base) applies twice
    /// without error and without changing the result.
    #[test]
    fn add_only_diff_is_idempotent(after in lexeme()) {
        let mut base = Lexeme::blank();
        base.assign_id(after.id().unwrap().clone()).unwrap();
        base.set_language(after.language().cloned());
        base.set_lexical_category(after.lexical_category().cloned());

        let diff = diff_lexemes(&base, &after).unwrap();
        let once = patch_lexeme(&base, &diff).unwrap();
        let twice = patch_lexeme(&once, &diff).unwrap();
        prop_assert_eq!(&once, &after);
        prop_assert_eq!(twice, once);
    }

    /// A term list keeps at most one term per language, and the last
    /// put for a language wins.
    #[test]
    fn term_list_is_unique_per_language(
        entries in prop::collection::vec((language_code(), "[a-z]{1,12}"), 0..12)
    ) {
        let mut list = TermList::new();
        let mut expected: BTreeMap<String, String> = BTreeMap::new();
        for (language, text) in entries {
            list.put(Term::new(&language, &text).unwrap());
            expected.insert(language, text);
        }

        prop_assert_eq!(list.len(), expected.len());
        for (language, text) in &expected {
            prop_assert_eq!(list.text_for(language), Some(text.as_str()));
        }
    }
}
