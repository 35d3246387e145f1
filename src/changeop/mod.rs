//! changeop
//!
//! Validated, composable mutation commands over the entity model.
//!
//! Every change operation offers the same capability set: `validate` (never
//! mutates), `apply` (returns a new snapshot after an internal validation
//! pass) and `actions` (natural-language-independent tags describing what
//! the operation does). Operations form a closed sum type; applying one to
//! an entity of the wrong kind fails with
//! [`ChangeOpError::TypeMismatch`] instead of silently coercing.
//!
//! Validation failures are structured: a field-name path plus an error-kind
//! tag. The core never renders user-facing text for them beyond `Display`
//! diagnostics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::ids::{FormId, SenseId};
use crate::core::lexeme::{Form, Lexeme, Sense};
use crate::core::statements::{new_guid, Statement};
use crate::core::terms::{ItemReference, Term, TermList};

/// The kind of entity a change operation was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Lexeme,
    Form,
    Sense,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Lexeme => "lexeme",
            EntityKind::Form => "form",
            EntityKind::Sense => "sense",
        };
        write!(f, "{name}")
    }
}

/// A change-operation target: one of the three entity kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Lexeme(Lexeme),
    Form(Form),
    Sense(Sense),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Lexeme(_) => EntityKind::Lexeme,
            Entity::Form(_) => EntityKind::Form,
            Entity::Sense(_) => EntityKind::Sense,
        }
    }
}

/// The machine-readable kind of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    #[error("empty term text")]
    EmptyTermText,

    #[error("empty term language")]
    EmptyTermLanguage,

    #[error("non-unique language")]
    NonUniqueLanguage,

    #[error("required term list would be empty")]
    EmptyTermList,

    #[error("invalid parent reference")]
    InvalidParentReference,

    #[error("form not found")]
    UnknownForm,

    #[error("sense not found")]
    UnknownSense,

    #[error("statement not found")]
    UnknownStatement,
}

/// A structured validation failure: a field-name path plus an error kind.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} at {}", path.join("/"))]
pub struct Violation {
    pub path: Vec<String>,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn new(path: impl IntoIterator<Item = impl Into<String>>, kind: ViolationKind) -> Self {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            kind,
        }
    }
}

/// Errors from change-operation validation and application.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChangeOpError {
    /// The operation targets a different entity kind.
    #[error("operation for a {expected} cannot be applied to a {found}")]
    TypeMismatch {
        expected: EntityKind,
        found: EntityKind,
    },

    #[error(transparent)]
    Invalid(#[from] Violation),
}

/// A single edit to a term list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TermEdit {
    /// Set the text for a language, adding or replacing the term.
    Set { language: String, value: String },
    /// Remove the term for a language.
    Remove { language: String },
}

impl TermEdit {
    fn language(&self) -> &str {
        match self {
            TermEdit::Set { language, .. } | TermEdit::Remove { language } => language,
        }
    }
}

/// A single edit to a statement list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatementEdit {
    Add { statement: Statement },
    Remove { guid: String },
    Replace { statement: Statement },
}

/// A validated, composable change operation.
///
/// # Example
///
/// ```
/// use lexmerge::changeop::{ChangeOp, Entity, TermEdit};
/// use lexmerge::core::lexeme::Lexeme;
///
/// let op = ChangeOp::EditLemmas {
///     edits: vec![TermEdit::Set { language: "en".into(), value: "cat".into() }],
/// };
/// let entity = Entity::Lexeme(Lexeme::blank());
///
/// op.validate(&entity).unwrap();
/// let Entity::Lexeme(edited) = op.apply(&entity).unwrap() else { unreachable!() };
/// assert_eq!(edited.lemmas().text_for("en"), Some("cat"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum ChangeOp {
    #[serde(rename_all = "camelCase")]
    AddForm {
        representations: TermList,
        #[serde(default)]
        grammatical_features: Vec<ItemReference>,
    },
    #[serde(rename_all = "camelCase")]
    EditForm {
        id: FormId,
        #[serde(default)]
        representations: Vec<TermEdit>,
        #[serde(default)]
        add_features: Vec<ItemReference>,
        #[serde(default)]
        remove_features: Vec<ItemReference>,
        #[serde(default)]
        statements: Vec<StatementEdit>,
    },
    RemoveForm {
        id: FormId,
    },
    AddSense {
        glosses: TermList,
    },
    EditSense {
        id: SenseId,
        #[serde(default)]
        glosses: Vec<TermEdit>,
        #[serde(default)]
        statements: Vec<StatementEdit>,
    },
    RemoveSense {
        id: SenseId,
    },
    EditLemmas {
        edits: Vec<TermEdit>,
    },
    SetLanguage {
        language: ItemReference,
    },
    SetLexicalCategory {
        category: ItemReference,
    },
    EditStatements {
        edits: Vec<StatementEdit>,
    },
    /// Child operations applied in list order.
    Composite {
        ops: Vec<ChangeOp>,
    },
}

impl ChangeOp {
    /// Action tags describing this operation. For a composite, the
    /// deduplicated union of the children's tags, in first-seen order.
    pub fn actions(&self) -> Vec<&'static str> {
        match self {
            ChangeOp::AddForm { .. } => vec!["add-form"],
            ChangeOp::EditForm { .. } => vec!["edit-form"],
            ChangeOp::RemoveForm { .. } => vec!["remove-form"],
            ChangeOp::AddSense { .. } => vec!["add-sense"],
            ChangeOp::EditSense { .. } => vec!["edit-sense"],
            ChangeOp::RemoveSense { .. } => vec!["remove-sense"],
            ChangeOp::EditLemmas { .. } => vec!["edit-lemmas"],
            ChangeOp::SetLanguage { .. } => vec!["set-language"],
            ChangeOp::SetLexicalCategory { .. } => vec!["set-lexical-category"],
            ChangeOp::EditStatements { .. } => vec!["edit-statements"],
            ChangeOp::Composite { ops } => {
                let mut actions: Vec<&'static str> = Vec::new();
                for op in ops {
                    for action in op.actions() {
                        if !actions.contains(&action) {
                            actions.push(action);
                        }
                    }
                }
                actions
            }
        }
    }

    /// Check whether the operation can be applied. Never mutates.
    pub fn validate(&self, entity: &Entity) -> Result<(), ChangeOpError> {
        self.apply(entity).map(|_| ())
    }

    /// Apply the operation, producing a new snapshot.
    ///
    /// The input entity is never modified; on failure nothing is returned,
    /// so a failed application cannot leak partial edits.
    pub fn apply(&self, entity: &Entity) -> Result<Entity, ChangeOpError> {
        match self {
            ChangeOp::Composite { ops } => {
                let mut current = entity.clone();
                for op in ops {
                    current = op.apply(&current)?;
                }
                Ok(current)
            }
            _ => self.apply_single(entity),
        }
    }

    fn apply_single(&self, entity: &Entity) -> Result<Entity, ChangeOpError> {
        match (self, entity) {
            (ChangeOp::AddForm { .. }, Entity::Lexeme(lexeme))
            | (ChangeOp::RemoveForm { .. }, Entity::Lexeme(lexeme))
            | (ChangeOp::AddSense { .. }, Entity::Lexeme(lexeme))
            | (ChangeOp::RemoveSense { .. }, Entity::Lexeme(lexeme))
            | (ChangeOp::EditLemmas { .. }, Entity::Lexeme(lexeme))
            | (ChangeOp::SetLanguage { .. }, Entity::Lexeme(lexeme))
            | (ChangeOp::SetLexicalCategory { .. }, Entity::Lexeme(lexeme))
            | (ChangeOp::EditForm { .. }, Entity::Lexeme(lexeme))
            | (ChangeOp::EditSense { .. }, Entity::Lexeme(lexeme)) => {
                Ok(Entity::Lexeme(self.apply_to_lexeme(lexeme)?))
            }

            (ChangeOp::EditForm { id, representations, add_features, remove_features, statements }, Entity::Form(form)) => {
                let edited =
                    edit_form(form, Some(id), representations, add_features, remove_features, statements)?;
                Ok(Entity::Form(edited))
            }

            (ChangeOp::EditSense { id, glosses, statements }, Entity::Sense(sense)) => {
                let edited = edit_sense(sense, Some(id), glosses, statements)?;
                Ok(Entity::Sense(edited))
            }

            (ChangeOp::EditStatements { edits }, Entity::Lexeme(lexeme)) => {
                let mut edited = lexeme.clone();
                let owner = lexeme.id().map(|id| id.to_string());
                apply_statement_edits(edited.statements_mut(), edits, owner.as_deref(), &["claims"])?;
                Ok(Entity::Lexeme(edited))
            }
            (ChangeOp::EditStatements { edits }, Entity::Form(form)) => {
                let mut edited = form.clone();
                let owner = form.assigned_id().ok().map(|id| id.to_string());
                apply_statement_edits(edited.statements_mut(), edits, owner.as_deref(), &["claims"])?;
                Ok(Entity::Form(edited))
            }
            (ChangeOp::EditStatements { edits }, Entity::Sense(sense)) => {
                let mut edited = sense.clone();
                let owner = sense.assigned_id().ok().map(|id| id.to_string());
                apply_statement_edits(edited.statements_mut(), edits, owner.as_deref(), &["claims"])?;
                Ok(Entity::Sense(edited))
            }

            (op, other) => Err(ChangeOpError::TypeMismatch {
                expected: op.expected_kind(),
                found: other.kind(),
            }),
        }
    }

    /// The entity kind an operation is meant for, used in mismatch reports.
    fn expected_kind(&self) -> EntityKind {
        match self {
            ChangeOp::EditForm { .. } => EntityKind::Form,
            ChangeOp::EditSense { .. } => EntityKind::Sense,
            _ => EntityKind::Lexeme,
        }
    }

    fn apply_to_lexeme(&self, lexeme: &Lexeme) -> Result<Lexeme, ChangeOpError> {
        let mut edited = lexeme.clone();
        match self {
            ChangeOp::AddForm {
                representations,
                grammatical_features,
            } => {
                if representations.is_empty() {
                    return Err(Violation::new(["representations"], ViolationKind::EmptyTermList).into());
                }
                let mut form = Form::blank();
                form.set_representations(representations.clone());
                form.set_grammatical_features(grammatical_features.clone());
                edited
                    .add_form(form)
                    .map_err(|_| Violation::new(["forms"], ViolationKind::InvalidParentReference))?;
            }

            ChangeOp::EditForm {
                id,
                representations,
                add_features,
                remove_features,
                statements,
            } => {
                check_parent(lexeme, id.parent().as_str(), &["forms", &id.to_string()])?;
                let form = edited.form(id).ok_or_else(|| {
                    Violation::new(["forms", &id.to_string()], ViolationKind::UnknownForm)
                })?;
                let patched =
                    edit_form(form, None, representations, add_features, remove_features, statements)?;
                *edited.form_mut(id).ok_or_else(|| {
                    Violation::new(["forms", &id.to_string()], ViolationKind::UnknownForm)
                })? = patched;
            }

            ChangeOp::RemoveForm { id } => {
                check_parent(lexeme, id.parent().as_str(), &["forms", &id.to_string()])?;
                if edited.remove_form(id).is_none() {
                    return Err(
                        Violation::new(["forms", &id.to_string()], ViolationKind::UnknownForm).into(),
                    );
                }
            }

            ChangeOp::AddSense { glosses } => {
                if glosses.is_empty() {
                    return Err(Violation::new(["glosses"], ViolationKind::EmptyTermList).into());
                }
                let mut sense = Sense::blank();
                sense.set_glosses(glosses.clone());
                edited
                    .add_sense(sense)
                    .map_err(|_| Violation::new(["senses"], ViolationKind::InvalidParentReference))?;
            }

            ChangeOp::EditSense { id, glosses, statements } => {
                check_parent(lexeme, id.parent().as_str(), &["senses", &id.to_string()])?;
                let sense = edited.sense(id).ok_or_else(|| {
                    Violation::new(["senses", &id.to_string()], ViolationKind::UnknownSense)
                })?;
                let patched = edit_sense(sense, None, glosses, statements)?;
                *edited.sense_mut(id).ok_or_else(|| {
                    Violation::new(["senses", &id.to_string()], ViolationKind::UnknownSense)
                })? = patched;
            }

            ChangeOp::RemoveSense { id } => {
                check_parent(lexeme, id.parent().as_str(), &["senses", &id.to_string()])?;
                if edited.remove_sense(id).is_none() {
                    return Err(
                        Violation::new(["senses", &id.to_string()], ViolationKind::UnknownSense)
                            .into(),
                    );
                }
            }

            ChangeOp::EditLemmas { edits } => {
                let mut lemmas = edited.lemmas().clone();
                apply_term_edits(&mut lemmas, edits, &["lemmas"])?;
                // A saved lexeme must keep at least one lemma.
                if lemmas.is_empty() {
                    return Err(Violation::new(["lemmas"], ViolationKind::EmptyTermList).into());
                }
                *edited.lemmas_mut() = lemmas;
            }

            ChangeOp::SetLanguage { language } => {
                edited.set_language(Some(language.clone()));
            }

            ChangeOp::SetLexicalCategory { category } => {
                edited.set_lexical_category(Some(category.clone()));
            }

            // Dispatched on the entity kind in apply_single.
            ChangeOp::EditStatements { .. } | ChangeOp::Composite { .. } => unreachable!(),
        }
        Ok(edited)
    }
}

fn check_parent(lexeme: &Lexeme, parent: &str, path: &[&str]) -> Result<(), Violation> {
    match lexeme.id() {
        Some(id) if id.as_str() == parent => Ok(()),
        _ => Err(Violation::new(
            path.iter().copied(),
            ViolationKind::InvalidParentReference,
        )),
    }
}

fn apply_term_edits(list: &mut TermList, edits: &[TermEdit], path: &[&str]) -> Result<(), Violation> {
    // One edit per language per request.
    for (i, edit) in edits.iter().enumerate() {
        if edits[..i].iter().any(|e| e.language() == edit.language()) {
            return Err(Violation::new(
                path.iter().copied().chain([edit.language()]),
                ViolationKind::NonUniqueLanguage,
            ));
        }
    }

    for edit in edits {
        match edit {
            TermEdit::Set { language, value } => {
                if language.is_empty() {
                    return Err(Violation::new(
                        path.iter().copied(),
                        ViolationKind::EmptyTermLanguage,
                    ));
                }
                if value.is_empty() {
                    // Empty text is represented by absence; an explicit
                    // remove edit is the way to get there.
                    return Err(Violation::new(
                        path.iter().copied().chain([language.as_str()]),
                        ViolationKind::EmptyTermText,
                    ));
                }
                let term = Term::new(language.clone(), value.clone()).map_err(|_| {
                    Violation::new(path.iter().copied(), ViolationKind::EmptyTermText)
                })?;
                list.put(term);
            }
            TermEdit::Remove { language } => {
                list.remove(language);
            }
        }
    }
    Ok(())
}

fn apply_statement_edits(
    list: &mut crate::core::statements::StatementList,
    edits: &[StatementEdit],
    owner: Option<&str>,
    path: &[&str],
) -> Result<(), Violation> {
    for edit in edits {
        match edit {
            StatementEdit::Add { statement } => {
                let mut statement = statement.clone();
                if statement.guid().is_none() {
                    if let Some(owner) = owner {
                        statement = statement.with_guid(new_guid(owner));
                    }
                }
                list.push(statement);
            }
            StatementEdit::Remove { guid } => {
                if list.remove_by_guid(guid).is_none() {
                    return Err(Violation::new(
                        path.iter().copied().chain([guid.as_str()]),
                        ViolationKind::UnknownStatement,
                    ));
                }
            }
            StatementEdit::Replace { statement } => {
                if !list.replace_by_guid(statement.clone()) {
                    return Err(Violation::new(
                        path.iter()
                            .copied()
                            .chain([statement.guid().unwrap_or("<no guid>")]),
                        ViolationKind::UnknownStatement,
                    ));
                }
            }
        }
    }
    Ok(())
}

fn edit_form(
    form: &Form,
    required_id: Option<&FormId>,
    representations: &[TermEdit],
    add_features: &[ItemReference],
    remove_features: &[ItemReference],
    statements: &[StatementEdit],
) -> Result<Form, ChangeOpError> {
    if let Some(required) = required_id {
        if form.assigned_id() != Ok(required) {
            return Err(Violation::new(
                ["forms", &required.to_string()],
                ViolationKind::InvalidParentReference,
            )
            .into());
        }
    }

    let mut edited = form.clone();
    let mut terms = edited.representations().clone();
    apply_term_edits(&mut terms, representations, &["representations"])?;
    if terms.is_empty() {
        return Err(Violation::new(["representations"], ViolationKind::EmptyTermList).into());
    }
    edited.set_representations(terms);

    for feature in add_features {
        edited.add_grammatical_feature(feature.clone());
    }
    for feature in remove_features {
        edited.remove_grammatical_feature(feature);
    }

    let owner = edited.assigned_id().ok().map(|id| id.to_string());
    apply_statement_edits(edited.statements_mut(), statements, owner.as_deref(), &["claims"])?;
    Ok(edited)
}

fn edit_sense(
    sense: &Sense,
    required_id: Option<&SenseId>,
    glosses: &[TermEdit],
    statements: &[StatementEdit],
) -> Result<Sense, ChangeOpError> {
    if let Some(required) = required_id {
        if sense.assigned_id() != Ok(required) {
            return Err(Violation::new(
                ["senses", &required.to_string()],
                ViolationKind::InvalidParentReference,
            )
            .into());
        }
    }

    let mut edited = sense.clone();
    let mut terms = edited.glosses().clone();
    apply_term_edits(&mut terms, glosses, &["glosses"])?;
    if terms.is_empty() {
        return Err(Violation::new(["glosses"], ViolationKind::EmptyTermList).into());
    }
    edited.set_glosses(terms);

    let owner = edited.assigned_id().ok().map(|id| id.to_string());
    apply_statement_edits(edited.statements_mut(), statements, owner.as_deref(), &["claims"])?;
    Ok(edited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::LexemeId;

    fn item(s: &str) -> ItemReference {
        ItemReference::new(s).unwrap()
    }

    fn term(lang: &str, text: &str) -> Term {
        Term::new(lang, text).unwrap()
    }

    fn saved_lexeme(id: &str) -> Lexeme {
        let mut lexeme = Lexeme::blank();
        lexeme.assign_id(LexemeId::new(id).unwrap()).unwrap();
        lexeme
    }

    #[test]
    fn sense_edit_on_bare_form_is_type_mismatch() {
        let op = ChangeOp::EditSense {
            id: SenseId::parse("L7-S1").unwrap(),
            glosses: vec![],
            statements: vec![],
        };
        let form = Entity::Form(Form::blank());
        let result = op.apply(&form);
        assert_eq!(
            result,
            Err(ChangeOpError::TypeMismatch {
                expected: EntityKind::Sense,
                found: EntityKind::Form,
            })
        );
    }

    #[test]
    fn validate_never_mutates() {
        let op = ChangeOp::SetLanguage {
            language: item("Q1860"),
        };
        let entity = Entity::Lexeme(Lexeme::blank());
        let snapshot = entity.clone();
        op.validate(&entity).unwrap();
        assert_eq!(entity, snapshot);
    }

    #[test]
    fn add_form_requires_representations() {
        let op = ChangeOp::AddForm {
            representations: TermList::new(),
            grammatical_features: vec![],
        };
        let result = op.apply(&Entity::Lexeme(saved_lexeme("L7")));
        assert_eq!(
            result,
            Err(ChangeOpError::Invalid(Violation::new(
                ["representations"],
                ViolationKind::EmptyTermList
            )))
        );
    }

    #[test]
    fn empty_term_text_is_a_structured_violation() {
        let op = ChangeOp::EditLemmas {
            edits: vec![TermEdit::Set {
                language: "en".into(),
                value: "".into(),
            }],
        };
        match op.apply(&Entity::Lexeme(saved_lexeme("L7"))) {
            Err(ChangeOpError::Invalid(v)) => {
                assert_eq!(v.kind, ViolationKind::EmptyTermText);
                assert_eq!(v.path, vec!["lemmas", "en"]);
            }
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_language_edits_rejected() {
        let op = ChangeOp::EditLemmas {
            edits: vec![
                TermEdit::Set {
                    language: "en".into(),
                    value: "a".into(),
                },
                TermEdit::Set {
                    language: "en".into(),
                    value: "b".into(),
                },
            ],
        };
        match op.apply(&Entity::Lexeme(saved_lexeme("L7"))) {
            Err(ChangeOpError::Invalid(v)) => {
                assert_eq!(v.kind, ViolationKind::NonUniqueLanguage)
            }
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn removing_last_lemma_rejected() {
        let mut lexeme = saved_lexeme("L7");
        lexeme.lemmas_mut().put(term("en", "cat"));
        let op = ChangeOp::EditLemmas {
            edits: vec![TermEdit::Remove {
                language: "en".into(),
            }],
        };
        match op.apply(&Entity::Lexeme(lexeme)) {
            Err(ChangeOpError::Invalid(v)) => assert_eq!(v.kind, ViolationKind::EmptyTermList),
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn edit_form_on_foreign_id_is_invalid_parent_reference() {
        let op = ChangeOp::RemoveForm {
            id: FormId::parse("L9-F1").unwrap(),
        };
        match op.apply(&Entity::Lexeme(saved_lexeme("L7"))) {
            Err(ChangeOpError::Invalid(v)) => {
                assert_eq!(v.kind, ViolationKind::InvalidParentReference)
            }
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn add_form_attaches_pending_child() {
        let op = ChangeOp::AddForm {
            representations: TermList::from_terms([term("en", "cats")]),
            grammatical_features: vec![item("Q146"), item("Q146")],
        };
        let Entity::Lexeme(edited) = op.apply(&Entity::Lexeme(saved_lexeme("L7"))).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(edited.forms().len(), 1);
        assert_eq!(edited.forms()[0].grammatical_features(), &[item("Q146")]);
        assert!(!edited.forms()[0].id().is_assigned());
    }

    #[test]
    fn composite_applies_in_order_and_dedups_actions() {
        let op = ChangeOp::Composite {
            ops: vec![
                ChangeOp::EditLemmas {
                    edits: vec![TermEdit::Set {
                        language: "en".into(),
                        value: "cat".into(),
                    }],
                },
                ChangeOp::SetLanguage {
                    language: item("Q1860"),
                },
                ChangeOp::EditLemmas {
                    edits: vec![TermEdit::Set {
                        language: "de".into(),
                        value: "Katze".into(),
                    }],
                },
            ],
        };

        assert_eq!(op.actions(), vec!["edit-lemmas", "set-language"]);

        let Entity::Lexeme(edited) = op.apply(&Entity::Lexeme(saved_lexeme("L7"))).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(edited.lemmas().len(), 2);
        assert_eq!(edited.language(), Some(&item("Q1860")));
    }

    #[test]
    fn composite_fails_atomically() {
        let op = ChangeOp::Composite {
            ops: vec![
                ChangeOp::SetLanguage {
                    language: item("Q1860"),
                },
                ChangeOp::RemoveForm {
                    id: FormId::parse("L7-F1").unwrap(),
                },
            ],
        };
        let entity = Entity::Lexeme(saved_lexeme("L7"));
        assert!(op.apply(&entity).is_err());
        // Input untouched regardless.
        let Entity::Lexeme(lexeme) = &entity else { unreachable!() };
        assert_eq!(lexeme.language(), None);
    }

    #[test]
    fn statement_add_draws_owner_scoped_guid() {
        let op = ChangeOp::EditStatements {
            edits: vec![StatementEdit::Add {
                statement: Statement::new(
                    item("P5"),
                    crate::core::statements::StatementValue::Text("x".into()),
                ),
            }],
        };
        let Entity::Lexeme(edited) = op.apply(&Entity::Lexeme(saved_lexeme("L7"))).unwrap()
        else {
            unreachable!()
        };
        let guid = edited.statements().iter().next().unwrap().guid().unwrap();
        assert!(guid.starts_with("L7$"));
    }

    #[test]
    fn changeop_deserializes_from_tagged_json() {
        let json = r#"{
            "op": "edit-form",
            "id": "L7-F1",
            "representations": [{"type": "set", "language": "en", "value": "cats"}],
            "addFeatures": ["Q146"]
        }"#;
        let op: ChangeOp = serde_json::from_str(json).unwrap();
        match op {
            ChangeOp::EditForm { id, representations, add_features, .. } => {
                assert_eq!(id.to_string(), "L7-F1");
                assert_eq!(representations.len(), 1);
                assert_eq!(add_features, vec![item("Q146")]);
            }
            other => panic!("unexpected op {other:?}"),
        }
    }
}
