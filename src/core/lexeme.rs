//! core::lexeme
//!
//! The Lexeme/Form/Sense entity model.
//!
//! # Ownership
//!
//! Forms and Senses are owned exclusively by their Lexeme; they never exist
//! detached except as blanks awaiting attachment. All entities are plain
//! owned data: `clone()` deep-copies every collection, so a copy and its
//! original never alias internal state.
//!
//! # Equality
//!
//! Structural equality ignores declaration order of forms, senses and
//! grammatical features (features are canonically sorted on every write, so
//! only the child collections need order-insensitive comparison) but
//! respects term-list and statement-list order.
//!
//! # Invariants
//!
//! - Grammatical features are deduplicated and sorted by serialization
//! - `nextFormId`/`nextSenseId` never decrease and never collide with an
//!   existing child id
//! - Business invariants (e.g. "a saved lexeme has at least one lemma") are
//!   enforced by the change-operation layer, not by constructors, to allow
//!   staged construction

use serde::{Deserialize, Serialize};

use crate::core::ids::{FormId, FormIdState, IdError, LexemeId, SenseId, SenseIdState};
use crate::core::statements::StatementList;
use crate::core::terms::{ItemReference, TermList};

/// Deduplicate and canonically sort grammatical features by serialization.
fn normalize_features(mut features: Vec<ItemReference>) -> Vec<ItemReference> {
    features.sort();
    features.dedup();
    features
}

/// An inflected or variant realization of a Lexeme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FormRepr", from = "FormRepr")]
pub struct Form {
    id: FormIdState,
    representations: TermList,
    grammatical_features: Vec<ItemReference>,
    statements: StatementList,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FormRepr {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    id: Option<FormId>,
    representations: TermList,
    grammatical_features: Vec<ItemReference>,
    claims: StatementList,
}

impl From<Form> for FormRepr {
    fn from(form: Form) -> Self {
        // Pending placeholders are prediction-only and never persisted.
        let id = match form.id {
            FormIdState::Assigned(id) => Some(id),
            _ => None,
        };
        Self {
            id,
            representations: form.representations,
            grammatical_features: form.grammatical_features,
            claims: form.statements,
        }
    }
}

impl From<FormRepr> for Form {
    fn from(repr: FormRepr) -> Self {
        Self {
            id: match repr.id {
                Some(id) => FormIdState::Assigned(id),
                None => FormIdState::Unattached,
            },
            representations: repr.representations,
            grammatical_features: normalize_features(repr.grammatical_features),
            statements: repr.claims,
        }
    }
}

impl Form {
    /// Create a blank form, not yet attached to any lexeme.
    pub fn blank() -> Self {
        Self {
            id: FormIdState::Unattached,
            representations: TermList::new(),
            grammatical_features: Vec::new(),
            statements: StatementList::new(),
        }
    }

    /// Create a form with a permanent id.
    pub fn new(
        id: FormId,
        representations: TermList,
        grammatical_features: Vec<ItemReference>,
        statements: StatementList,
    ) -> Self {
        Self {
            id: FormIdState::Assigned(id),
            representations,
            grammatical_features: normalize_features(grammatical_features),
            statements,
        }
    }

    /// The identity state.
    pub fn id(&self) -> &FormIdState {
        &self.id
    }

    /// The permanent id.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Unassigned` for a blank or pending form.
    pub fn assigned_id(&self) -> Result<&FormId, IdError> {
        self.id.assigned()
    }

    pub(crate) fn set_id_state(&mut self, state: FormIdState) {
        self.id = state;
    }

    pub fn representations(&self) -> &TermList {
        &self.representations
    }

    pub fn representations_mut(&mut self) -> &mut TermList {
        &mut self.representations
    }

    pub fn set_representations(&mut self, representations: TermList) {
        self.representations = representations;
    }

    /// The grammatical features, deduplicated and canonically sorted.
    pub fn grammatical_features(&self) -> &[ItemReference] {
        &self.grammatical_features
    }

    pub fn set_grammatical_features(&mut self, features: Vec<ItemReference>) {
        self.grammatical_features = normalize_features(features);
    }

    /// Add a feature; adding one already present is a no-op.
    pub fn add_grammatical_feature(&mut self, feature: ItemReference) {
        if !self.grammatical_features.contains(&feature) {
            self.grammatical_features.push(feature);
            self.grammatical_features.sort();
        }
    }

    pub fn remove_grammatical_feature(&mut self, feature: &ItemReference) -> bool {
        let before = self.grammatical_features.len();
        self.grammatical_features.retain(|f| f != feature);
        self.grammatical_features.len() != before
    }

    pub fn statements(&self) -> &StatementList {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut StatementList {
        &mut self.statements
    }

    /// True iff every owned collection is empty.
    pub fn is_empty(&self) -> bool {
        self.representations.is_empty()
            && self.grammatical_features.is_empty()
            && self.statements.is_empty()
    }

    /// Reset representations, features and statements, keeping the id.
    ///
    /// Leaves the form in an insufficiently initialized state; callers are
    /// expected to repopulate it before saving.
    pub fn clear(&mut self) {
        self.representations = TermList::new();
        self.grammatical_features = Vec::new();
        self.statements = StatementList::new();
    }

    /// Content equality, ignoring the id.
    pub fn same_content(&self, other: &Form) -> bool {
        self.representations == other.representations
            && self.grammatical_features == other.grammatical_features
            && self.statements == other.statements
    }
}

/// A meaning of a Lexeme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SenseRepr", from = "SenseRepr")]
pub struct Sense {
    id: SenseIdState,
    glosses: TermList,
    statements: StatementList,
}

#[derive(Serialize, Deserialize)]
struct SenseRepr {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    id: Option<SenseId>,
    glosses: TermList,
    claims: StatementList,
}

impl From<Sense> for SenseRepr {
    fn from(sense: Sense) -> Self {
        let id = match sense.id {
            SenseIdState::Assigned(id) => Some(id),
            _ => None,
        };
        Self {
            id,
            glosses: sense.glosses,
            claims: sense.statements,
        }
    }
}

impl From<SenseRepr> for Sense {
    fn from(repr: SenseRepr) -> Self {
        Self {
            id: match repr.id {
                Some(id) => SenseIdState::Assigned(id),
                None => SenseIdState::Unattached,
            },
            glosses: repr.glosses,
            statements: repr.claims,
        }
    }
}

impl Sense {
    /// Create a blank sense, not yet attached to any lexeme.
    pub fn blank() -> Self {
        Self {
            id: SenseIdState::Unattached,
            glosses: TermList::new(),
            statements: StatementList::new(),
        }
    }

    /// Create a sense with a permanent id.
    pub fn new(id: SenseId, glosses: TermList, statements: StatementList) -> Self {
        Self {
            id: SenseIdState::Assigned(id),
            glosses,
            statements,
        }
    }

    pub fn id(&self) -> &SenseIdState {
        &self.id
    }

    /// The permanent id.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Unassigned` for a blank or pending sense.
    pub fn assigned_id(&self) -> Result<&SenseId, IdError> {
        self.id.assigned()
    }

    pub(crate) fn set_id_state(&mut self, state: SenseIdState) {
        self.id = state;
    }

    pub fn glosses(&self) -> &TermList {
        &self.glosses
    }

    pub fn glosses_mut(&mut self) -> &mut TermList {
        &mut self.glosses
    }

    pub fn set_glosses(&mut self, glosses: TermList) {
        self.glosses = glosses;
    }

    pub fn statements(&self) -> &StatementList {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut StatementList {
        &mut self.statements
    }

    /// True iff the glosses and statements are both empty.
    pub fn is_empty(&self) -> bool {
        self.glosses.is_empty() && self.statements.is_empty()
    }

    /// Reset glosses and statements, keeping the id.
    pub fn clear(&mut self) {
        self.glosses = TermList::new();
        self.statements = StatementList::new();
    }

    /// Content equality, ignoring the id.
    pub fn same_content(&self, other: &Sense) -> bool {
        self.glosses == other.glosses && self.statements == other.statements
    }
}

/// The root lexicographical entity.
///
/// # Example
///
/// ```
/// use lexmerge::core::lexeme::{Form, Lexeme};
/// use lexmerge::core::ids::LexemeId;
/// use lexmerge::core::terms::{ItemReference, Term};
///
/// let mut lexeme = Lexeme::blank();
/// lexeme.assign_id(LexemeId::new("L7").unwrap()).unwrap();
/// lexeme.lemmas_mut().put(Term::new("en", "cat").unwrap());
/// lexeme.set_language(Some(ItemReference::new("Q1860").unwrap()));
///
/// lexeme.add_form(Form::blank()).unwrap();
/// lexeme.assign_child_ids().unwrap();
/// assert_eq!(lexeme.forms()[0].assigned_id().unwrap().to_string(), "L7-F1");
/// ```
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "LexemeRepr", into = "LexemeRepr")]
pub struct Lexeme {
    id: Option<LexemeId>,
    lemmas: TermList,
    language: Option<ItemReference>,
    lexical_category: Option<ItemReference>,
    statements: StatementList,
    forms: Vec<Form>,
    senses: Vec<Sense>,
    next_form_id: u32,
    next_sense_id: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LexemeRepr {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    id: Option<LexemeId>,
    lemmas: TermList,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    language: Option<ItemReference>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    lexical_category: Option<ItemReference>,
    claims: StatementList,
    forms: Vec<Form>,
    senses: Vec<Sense>,
    next_form_id: u32,
    next_sense_id: u32,
}

impl From<Lexeme> for LexemeRepr {
    fn from(lexeme: Lexeme) -> Self {
        Self {
            id: lexeme.id,
            lemmas: lexeme.lemmas,
            language: lexeme.language,
            lexical_category: lexeme.lexical_category,
            claims: lexeme.statements,
            forms: lexeme.forms,
            senses: lexeme.senses,
            next_form_id: lexeme.next_form_id,
            next_sense_id: lexeme.next_sense_id,
        }
    }
}

impl TryFrom<LexemeRepr> for Lexeme {
    type Error = IdError;

    fn try_from(mut repr: LexemeRepr) -> Result<Self, Self::Error> {
        // Child ids must reference this lexeme as their parent; children
        // serialized without an id are still owned by it, so they attach as
        // pending.
        if let Some(id) = &repr.id {
            for form in &mut repr.forms {
                match form.id() {
                    FormIdState::Assigned(fid) if fid.parent() != id => {
                        return Err(IdError::WrongParent);
                    }
                    FormIdState::Unattached => {
                        form.set_id_state(FormIdState::Pending(id.clone()));
                    }
                    _ => {}
                }
            }
            for sense in &mut repr.senses {
                match sense.id() {
                    SenseIdState::Assigned(sid) if sid.parent() != id => {
                        return Err(IdError::WrongParent);
                    }
                    SenseIdState::Unattached => {
                        sense.set_id_state(SenseIdState::Pending(id.clone()));
                    }
                    _ => {}
                }
            }
        }

        let max_form = repr
            .forms
            .iter()
            .filter_map(|f| f.assigned_id().ok().map(FormId::local_id))
            .max()
            .unwrap_or(0);
        let max_sense = repr
            .senses
            .iter()
            .filter_map(|s| s.assigned_id().ok().map(SenseId::local_id))
            .max()
            .unwrap_or(0);

        Ok(Self {
            id: repr.id,
            lemmas: repr.lemmas,
            language: repr.language,
            lexical_category: repr.lexical_category,
            statements: repr.claims,
            forms: repr.forms,
            senses: repr.senses,
            // Counters never move backwards or collide with existing ids.
            next_form_id: repr.next_form_id.max(max_form.saturating_add(1)),
            next_sense_id: repr.next_sense_id.max(max_sense.saturating_add(1)),
        })
    }
}

impl Lexeme {
    /// Create a blank lexeme: no id, no lemmas, nothing set.
    pub fn blank() -> Self {
        Self {
            id: None,
            lemmas: TermList::new(),
            language: None,
            lexical_category: None,
            statements: StatementList::new(),
            forms: Vec::new(),
            senses: Vec::new(),
            next_form_id: 1,
            next_sense_id: 1,
        }
    }

    /// The permanent id, if assigned.
    pub fn id(&self) -> Option<&LexemeId> {
        self.id.as_ref()
    }

    /// Assign the permanent id. Ids are immutable once assigned.
    ///
    /// Blank children become pending against the new id.
    ///
    /// # Errors
    ///
    /// Returns `IdError::AlreadyAssigned` if an id is already set.
    pub fn assign_id(&mut self, id: LexemeId) -> Result<(), IdError> {
        if self.id.is_some() {
            return Err(IdError::AlreadyAssigned);
        }
        for form in &mut self.forms {
            if matches!(form.id(), FormIdState::Unattached) {
                form.set_id_state(FormIdState::Pending(id.clone()));
            }
        }
        for sense in &mut self.senses {
            if matches!(sense.id(), SenseIdState::Unattached) {
                sense.set_id_state(SenseIdState::Pending(id.clone()));
            }
        }
        self.id = Some(id);
        Ok(())
    }

    pub fn lemmas(&self) -> &TermList {
        &self.lemmas
    }

    pub fn lemmas_mut(&mut self) -> &mut TermList {
        &mut self.lemmas
    }

    pub fn language(&self) -> Option<&ItemReference> {
        self.language.as_ref()
    }

    pub fn set_language(&mut self, language: Option<ItemReference>) {
        self.language = language;
    }

    pub fn lexical_category(&self) -> Option<&ItemReference> {
        self.lexical_category.as_ref()
    }

    pub fn set_lexical_category(&mut self, category: Option<ItemReference>) {
        self.lexical_category = category;
    }

    pub fn statements(&self) -> &StatementList {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut StatementList {
        &mut self.statements
    }

    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    pub fn senses(&self) -> &[Sense] {
        &self.senses
    }

    /// Attach a form to this lexeme.
    ///
    /// A blank form becomes pending if this lexeme already has an id. A form
    /// that already carries a permanent id is accepted only if it belongs to
    /// this lexeme.
    ///
    /// # Errors
    ///
    /// Returns `IdError::WrongParent` for a form owned by another lexeme.
    pub fn add_form(&mut self, mut form: Form) -> Result<(), IdError> {
        match form.id() {
            FormIdState::Assigned(fid) => {
                if Some(fid.parent()) != self.id.as_ref() {
                    return Err(IdError::WrongParent);
                }
                self.next_form_id = self.next_form_id.max(fid.local_id().saturating_add(1));
            }
            FormIdState::Pending(parent) => {
                if Some(parent) != self.id.as_ref() {
                    return Err(IdError::WrongParent);
                }
            }
            FormIdState::Unattached => {
                if let Some(id) = &self.id {
                    form.set_id_state(FormIdState::Pending(id.clone()));
                }
            }
        }
        self.forms.push(form);
        Ok(())
    }

    /// Attach a sense to this lexeme. Same rules as [`Lexeme::add_form`].
    pub fn add_sense(&mut self, mut sense: Sense) -> Result<(), IdError> {
        match sense.id() {
            SenseIdState::Assigned(sid) => {
                if Some(sid.parent()) != self.id.as_ref() {
                    return Err(IdError::WrongParent);
                }
                self.next_sense_id = self.next_sense_id.max(sid.local_id().saturating_add(1));
            }
            SenseIdState::Pending(parent) => {
                if Some(parent) != self.id.as_ref() {
                    return Err(IdError::WrongParent);
                }
            }
            SenseIdState::Unattached => {
                if let Some(id) = &self.id {
                    sense.set_id_state(SenseIdState::Pending(id.clone()));
                }
            }
        }
        self.senses.push(sense);
        Ok(())
    }

    /// Look up a form by id. Returns an explicit not-found value.
    pub fn form(&self, id: &FormId) -> Option<&Form> {
        self.forms.iter().find(|f| f.assigned_id() == Ok(id))
    }

    pub fn form_mut(&mut self, id: &FormId) -> Option<&mut Form> {
        self.forms.iter_mut().find(|f| f.assigned_id() == Ok(id))
    }

    /// Remove a form by id, returning it if it was present.
    pub fn remove_form(&mut self, id: &FormId) -> Option<Form> {
        let idx = self.forms.iter().position(|f| f.assigned_id() == Ok(id))?;
        Some(self.forms.remove(idx))
    }

    pub fn sense(&self, id: &SenseId) -> Option<&Sense> {
        self.senses.iter().find(|s| s.assigned_id() == Ok(id))
    }

    pub fn sense_mut(&mut self, id: &SenseId) -> Option<&mut Sense> {
        self.senses.iter_mut().find(|s| s.assigned_id() == Ok(id))
    }

    pub fn remove_sense(&mut self, id: &SenseId) -> Option<Sense> {
        let idx = self.senses.iter().position(|s| s.assigned_id() == Ok(id))?;
        Some(self.senses.remove(idx))
    }

    /// Draw the next fresh form-local id.
    pub fn take_next_form_id(&mut self) -> u32 {
        let n = self.next_form_id;
        self.next_form_id = self.next_form_id.saturating_add(1);
        n
    }

    /// Draw the next fresh sense-local id.
    pub fn take_next_sense_id(&mut self) -> u32 {
        let n = self.next_sense_id;
        self.next_sense_id = self.next_sense_id.saturating_add(1);
        n
    }

    pub fn next_form_id(&self) -> u32 {
        self.next_form_id
    }

    pub fn next_sense_id(&self) -> u32 {
        self.next_sense_id
    }

    /// Assign permanent ids to all pending or blank children.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Unassigned` if the lexeme itself has no id yet.
    pub fn assign_child_ids(&mut self) -> Result<(), IdError> {
        if self.id.is_none() {
            return Err(IdError::Unassigned("lexeme"));
        }
        // Pending children predict their id against the parent they were
        // attached to, which assign_id guarantees is this lexeme.
        for i in 0..self.forms.len() {
            if !self.forms[i].id().is_assigned() {
                let local = self.take_next_form_id();
                let id = self.forms[i].id().predict(local)?;
                self.forms[i].set_id_state(FormIdState::Assigned(id));
            }
        }
        for i in 0..self.senses.len() {
            if !self.senses[i].id().is_assigned() {
                let local = self.take_next_sense_id();
                let id = self.senses[i].id().predict(local)?;
                self.senses[i].set_id_state(SenseIdState::Assigned(id));
            }
        }
        Ok(())
    }

    /// Whether any statement on this lexeme or its children references the
    /// entity with the given serialized id.
    pub fn references_entity(&self, serialized_id: &str) -> bool {
        self.statements.references_entity(serialized_id)
            || self
                .forms
                .iter()
                .any(|f| f.statements().references_entity(serialized_id))
            || self
                .senses
                .iter()
                .any(|s| s.statements().references_entity(serialized_id))
    }

    /// True iff every term list, every collection and both scalar references
    /// are unset.
    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
            && self.language.is_none()
            && self.lexical_category.is_none()
            && self.statements.is_empty()
            && self.forms.is_empty()
            && self.senses.is_empty()
    }
}

impl PartialEq for Lexeme {
    /// Structural equality: form and sense declaration order is not
    /// significant, everything else compares in order.
    fn eq(&self, other: &Self) -> bool {
        fn unordered_eq<T: PartialEq>(a: &[T], b: &[T]) -> bool {
            if a.len() != b.len() {
                return false;
            }
            let mut unmatched: Vec<&T> = b.iter().collect();
            for item in a {
                match unmatched.iter().position(|c| *c == item) {
                    Some(idx) => {
                        unmatched.swap_remove(idx);
                    }
                    None => return false,
                }
            }
            true
        }

        self.id == other.id
            && self.lemmas == other.lemmas
            && self.language == other.language
            && self.lexical_category == other.lexical_category
            && self.statements == other.statements
            && unordered_eq(&self.forms, &other.forms)
            && unordered_eq(&self.senses, &other.senses)
    }
}
