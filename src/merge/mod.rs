//! merge
//!
//! Merges one lexeme into another while detecting true conflicts.
//!
//! # Protocol
//!
//! All preconditions are validated before any mutation. Each violated
//! precondition is a distinct, fatal [`MergeError`] variant, so callers can
//! present a precise message; the target is never partially mutated. Once
//! the preconditions hold, merging proceeds in order: lemmas, forms, senses,
//! root statements. Forms and senses are always re-attached under fresh
//! target-local ids — a source-side local id is only meaningful within the
//! source lexeme — and their content is never deduplicated against the
//! target (two independently created children are never "the same", even
//! with identical content).
//!
//! Statement merging is a pluggable strategy injected at construction; the
//! engine only requires "no information loss, GUIDs re-scoped to the new
//! owner".

use thiserror::Error;

use crate::core::ids::{FormId, LexemeId, SenseId};
use crate::core::lexeme::{Form, Lexeme, Sense};
use crate::core::statements::StatementList;

/// Errors from merge validation and application.
///
/// The first five variants are precondition failures, raised before any
/// mutation. `ModificationFailed` wraps an unexpected failure in the
/// mutation phase; by design every anticipated failure is caught in the
/// precondition phase, so it carries only the rendered cause.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("a lexeme cannot be merged into itself")]
    ReferenceSameLexeme,

    #[error("lexemes describing different languages cannot be merged")]
    DifferentLanguages,

    #[error("lexemes with different lexical categories cannot be merged")]
    DifferentLexicalCategories,

    #[error("conflicting lemma value for language '{language}'")]
    ConflictingLemmaValue { language: String },

    #[error("statements cross-referencing the merge partners were found")]
    CrossReferencing,

    #[error("cannot merge a lexeme that has not been saved")]
    UnsavedLexeme,

    #[error("modification failed: {0}")]
    ModificationFailed(String),
}

/// Pluggable strategy for merging root statement lists.
///
/// Implementations must not lose information and must re-scope GUIDs to the
/// new owner.
pub trait StatementsMerger {
    fn merge(
        &self,
        source: &StatementList,
        target_owner: &LexemeId,
        target: &mut StatementList,
    ) -> Result<(), MergeError>;
}

/// Default strategy: append every source statement, re-owned under the
/// target's id with a freshly scoped GUID suffix.
#[derive(Debug, Default)]
pub struct AppendRescopeMerger;

impl StatementsMerger for AppendRescopeMerger {
    fn merge(
        &self,
        source: &StatementList,
        target_owner: &LexemeId,
        target: &mut StatementList,
    ) -> Result<(), MergeError> {
        for statement in source {
            target.push(statement.re_owned(target_owner.as_str()));
        }
        Ok(())
    }
}

/// The merge engine.
///
/// # Example
///
/// ```
/// use lexmerge::core::ids::LexemeId;
/// use lexmerge::core::lexeme::Lexeme;
/// use lexmerge::core::terms::{ItemReference, Term};
/// use lexmerge::merge::LexemeMerger;
///
/// fn saved(id: &str, lemma: (&str, &str)) -> Lexeme {
///     let mut lexeme = Lexeme::blank();
///     lexeme.assign_id(LexemeId::new(id).unwrap()).unwrap();
///     lexeme.lemmas_mut().put(Term::new(lemma.0, lemma.1).unwrap());
///     lexeme.set_language(Some(ItemReference::new("Q1860").unwrap()));
///     lexeme.set_lexical_category(Some(ItemReference::new("Q1084").unwrap()));
///     lexeme
/// }
///
/// let source = saved("L1", ("de", "Katze"));
/// let mut target = saved("L2", ("en", "cat"));
///
/// LexemeMerger::with_default_strategy().merge(&source, &mut target).unwrap();
/// assert_eq!(target.lemmas().text_for("de"), Some("Katze"));
/// ```
pub struct LexemeMerger {
    statements_merger: Box<dyn StatementsMerger>,
}

impl LexemeMerger {
    /// Create a merger with an explicit statement merge strategy.
    pub fn new(statements_merger: Box<dyn StatementsMerger>) -> Self {
        Self { statements_merger }
    }

    /// Create a merger with the [`AppendRescopeMerger`] strategy.
    pub fn with_default_strategy() -> Self {
        Self::new(Box::new(AppendRescopeMerger))
    }

    /// Merge `source` into `target`.
    ///
    /// On success the target has absorbed the source's content and the
    /// source should be treated as retired. On any error the target is
    /// unmodified.
    pub fn merge(&self, source: &Lexeme, target: &mut Lexeme) -> Result<(), MergeError> {
        let target_id = self.validate(source, target)?.clone();

        // Work on a scratch copy so a failing step cannot leave the target
        // half merged.
        let mut merged = target.clone();
        Self::merge_lemmas(source, &mut merged);
        Self::merge_forms(source, &mut merged, &target_id)?;
        Self::merge_senses(source, &mut merged, &target_id)?;
        self.statements_merger
            .merge(source.statements(), &target_id, merged.statements_mut())?;

        *target = merged;
        Ok(())
    }

    fn validate<'t>(&self, source: &Lexeme, target: &'t Lexeme) -> Result<&'t LexemeId, MergeError> {
        let source_id = source.id().ok_or(MergeError::UnsavedLexeme)?;
        let target_id = target.id().ok_or(MergeError::UnsavedLexeme)?;

        if source_id == target_id {
            return Err(MergeError::ReferenceSameLexeme);
        }
        if source.language() != target.language() {
            return Err(MergeError::DifferentLanguages);
        }
        if source.lexical_category() != target.lexical_category() {
            return Err(MergeError::DifferentLexicalCategories);
        }

        for term in source.lemmas() {
            if let Some(existing) = target.lemmas().text_for(term.language()) {
                if existing != term.value() {
                    return Err(MergeError::ConflictingLemmaValue {
                        language: term.language().to_string(),
                    });
                }
            }
        }

        // A structural conflict distinct from a value conflict: statements
        // on either side referencing the other lexeme would become
        // self-references after the merge.
        if source.references_entity(target_id.as_str())
            || target.references_entity(source_id.as_str())
        {
            return Err(MergeError::CrossReferencing);
        }

        Ok(target_id)
    }

    /// Every `(language, text)` absent from the target is added; conflicting
    /// languages were already excluded by validation.
    fn merge_lemmas(source: &Lexeme, target: &mut Lexeme) {
        for term in source.lemmas() {
            if !target.lemmas().has_language(term.language()) {
                target.lemmas_mut().put(term.clone());
            }
        }
    }

    /// Append every source form as a newly attached child. Representations
    /// and features are copied verbatim; statements are re-owned to the new
    /// form id.
    fn merge_forms(source: &Lexeme, target: &mut Lexeme, target_id: &LexemeId) -> Result<(), MergeError> {
        for form in source.forms() {
            let local = target.take_next_form_id();
            let id = FormId::new(target_id.clone(), local)
                .map_err(|e| MergeError::ModificationFailed(e.to_string()))?;
            let re_owned = Form::new(
                id.clone(),
                form.representations().clone(),
                form.grammatical_features().to_vec(),
                form.statements().re_owned(&id.serialization()),
            );
            target
                .add_form(re_owned)
                .map_err(|e| MergeError::ModificationFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// Senses merge by the same append-and-reattach strategy as forms.
    fn merge_senses(source: &Lexeme, target: &mut Lexeme, target_id: &LexemeId) -> Result<(), MergeError> {
        for sense in source.senses() {
            let local = target.take_next_sense_id();
            let id = SenseId::new(target_id.clone(), local)
                .map_err(|e| MergeError::ModificationFailed(e.to_string()))?;
            let re_owned = Sense::new(
                id.clone(),
                sense.glosses().clone(),
                sense.statements().re_owned(&id.serialization()),
            );
            target
                .add_sense(re_owned)
                .map_err(|e| MergeError::ModificationFailed(e.to_string()))?;
        }
        Ok(())
    }
}
