//! diff::ops
//!
//! Diff value objects.
//!
//! A diff is a mapping of per-field sub-diffs. Term-list and statement-list
//! fields carry ordered lists of keyed operations, the grammatical-feature
//! set carries set operations, and the forms/senses collections carry child
//! operations keyed by composite sub-entity id. Only leaf operations are
//! atomic; the composed per-entity diffs are plain containers.
//!
//! Every remove and change operation records the expected old value, so the
//! patcher can detect that the snapshot it is applied to has diverged from
//! the `before` state the diff was computed against. Term-list and
//! statement-list adds also record the position the entry held in `after`,
//! so the patcher can splice it back into the same place.

use serde::{Deserialize, Serialize};

use crate::core::ids::{FormId, SenseId};
use crate::core::statements::Statement;
use crate::core::terms::ItemReference;
use crate::core::lexeme::{Form, Sense};

/// A single term-list operation, keyed by language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TermDiffOp {
    Add {
        language: String,
        value: String,
        /// Index the entry held in the `after` list.
        position: usize,
    },
    Remove {
        language: String,
        value: String,
    },
    Change {
        language: String,
        from: String,
        to: String,
    },
}

/// An ordered list of term operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermListDiff(pub Vec<TermDiffOp>);

impl TermListDiff {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single statement-list operation, keyed by GUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatementDiffOp {
    Add {
        statement: Statement,
        /// Index the statement held in the `after` list.
        position: usize,
    },
    Remove {
        statement: Statement,
    },
    Change {
        from: Statement,
        to: Statement,
    },
}

/// An ordered list of statement operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementListDiff(pub Vec<StatementDiffOp>);

impl StatementListDiff {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A grammatical-feature set operation. Set membership is by identity, not
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureDiffOp {
    Add { item: ItemReference },
    Remove { item: ItemReference },
}

/// Feature-set operations, adds in canonical sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSetDiff(pub Vec<FeatureDiffOp>);

impl FeatureSetDiff {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A change to an optional scalar item reference (language or lexical
/// category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemDiffOp {
    Set { to: ItemReference },
    Unset { from: ItemReference },
    Change { from: ItemReference, to: ItemReference },
}

/// A keyed operation on the forms collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormsDiffOp {
    /// Add a child carried in full.
    Add { form: Form },
    /// Remove the child with this id; `form` is the expected old value.
    Remove { id: FormId, form: Form },
    /// Apply a nested diff to the child with this id.
    Change { id: FormId, diff: FormDiff },
}

/// A keyed operation on the senses collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensesDiffOp {
    Add { sense: Sense },
    Remove { id: SenseId, sense: Sense },
    Change { id: SenseId, diff: SenseDiff },
}

/// The delta between two Form snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDiff {
    #[serde(default, skip_serializing_if = "TermListDiff::is_empty")]
    pub representations: TermListDiff,
    #[serde(default, skip_serializing_if = "FeatureSetDiff::is_empty")]
    pub grammatical_features: FeatureSetDiff,
    #[serde(default, skip_serializing_if = "StatementListDiff::is_empty")]
    pub claims: StatementListDiff,
}

impl FormDiff {
    pub fn is_empty(&self) -> bool {
        self.representations.is_empty()
            && self.grammatical_features.is_empty()
            && self.claims.is_empty()
    }
}

/// The delta between two Sense snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SenseDiff {
    #[serde(default, skip_serializing_if = "TermListDiff::is_empty")]
    pub glosses: TermListDiff,
    #[serde(default, skip_serializing_if = "StatementListDiff::is_empty")]
    pub claims: StatementListDiff,
}

impl SenseDiff {
    pub fn is_empty(&self) -> bool {
        self.glosses.is_empty() && self.claims.is_empty()
    }
}

/// The delta between two Lexeme snapshots: the composition of the lemma
/// term-list diff, the scalar language/lexical-category diffs, the root
/// statement-list diff and the keyed forms/senses diffs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexemeDiff {
    #[serde(default, skip_serializing_if = "TermListDiff::is_empty")]
    pub lemmas: TermListDiff,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<ItemDiffOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical_category: Option<ItemDiffOp>,
    #[serde(default, skip_serializing_if = "StatementListDiff::is_empty")]
    pub claims: StatementListDiff,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forms: Vec<FormsDiffOp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub senses: Vec<SensesDiffOp>,
}

impl LexemeDiff {
    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
            && self.language.is_none()
            && self.lexical_category.is_none()
            && self.claims.is_empty()
            && self.forms.is_empty()
            && self.senses.is_empty()
    }
}
