//! core::statements
//!
//! Owner-scoped statements and statement lists.
//!
//! Every persisted statement carries a GUID of the form
//! `<ownerId>$<uuid-v4>`, where the owner is the serialized id of the
//! Lexeme, Form or Sense holding the statement. Moving a statement to a new
//! owner (as the merge engine does) re-scopes it: the owner prefix is
//! rewritten and a fresh uuid suffix is drawn, so a statement GUID is never
//! shared between two entities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::terms::ItemReference;

/// Compose a fresh statement GUID scoped to `owner`.
pub fn new_guid(owner: &str) -> String {
    format!("{owner}${}", Uuid::new_v4())
}

/// The owner prefix of a GUID, if it has one.
pub fn guid_owner(guid: &str) -> Option<&str> {
    guid.split_once('$').map(|(owner, _)| owner)
}

/// The value of a statement.
///
/// The core only distinguishes values that reference another entity (needed
/// for cross-reference detection during merge) from everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StatementValue {
    /// A reference to another entity, by serialized id.
    Entity(String),
    /// An opaque literal value.
    Text(String),
}

/// A single typed statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    /// Owner-scoped GUID; absent until the owning entity is saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub property: ItemReference,
    pub value: StatementValue,
}

impl Statement {
    /// Create a statement with no GUID yet.
    pub fn new(property: ItemReference, value: StatementValue) -> Self {
        Self {
            id: None,
            property,
            value,
        }
    }

    /// Attach a GUID.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.id = Some(guid.into());
        self
    }

    /// The GUID, if assigned.
    pub fn guid(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether the statement's value references the entity with the given
    /// serialized id.
    pub fn references_entity(&self, serialized_id: &str) -> bool {
        matches!(&self.value, StatementValue::Entity(e) if e == serialized_id)
    }

    /// Copy this statement under a new owner, drawing a fresh GUID suffix.
    pub fn re_owned(&self, owner: &str) -> Self {
        Self {
            id: Some(new_guid(owner)),
            property: self.property.clone(),
            value: self.value.clone(),
        }
    }
}

/// An ordered list of statements.
///
/// Order is significant for equality and diffing; statements are identified
/// within the list by GUID.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementList(Vec<Statement>);

impl StatementList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_statements(statements: impl IntoIterator<Item = Statement>) -> Self {
        Self(statements.into_iter().collect())
    }

    /// Append a statement.
    pub fn push(&mut self, statement: Statement) {
        self.0.push(statement);
    }

    /// Insert a statement at `index`, clamped to the list length.
    pub fn insert(&mut self, index: usize, statement: Statement) {
        let index = index.min(self.0.len());
        self.0.insert(index, statement);
    }

    /// Find a statement by GUID.
    pub fn by_guid(&self, guid: &str) -> Option<&Statement> {
        self.0.iter().find(|s| s.guid() == Some(guid))
    }

    /// Remove a statement by GUID, returning it if it was present.
    pub fn remove_by_guid(&mut self, guid: &str) -> Option<Statement> {
        let idx = self.0.iter().position(|s| s.guid() == Some(guid))?;
        Some(self.0.remove(idx))
    }

    /// Remove the first statement equal to `statement`.
    ///
    /// Used to match statements that never received a GUID.
    pub fn remove_first_equal(&mut self, statement: &Statement) -> bool {
        match self.0.iter().position(|s| s == statement) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Replace the statement with the same GUID as `statement`.
    ///
    /// Returns false if no statement with that GUID exists.
    pub fn replace_by_guid(&mut self, statement: Statement) -> bool {
        let Some(guid) = statement.guid() else {
            return false;
        };
        match self.0.iter_mut().find(|s| s.guid() == Some(guid)) {
            Some(slot) => {
                *slot = statement;
                true
            }
            None => false,
        }
    }

    /// Replace the statement carrying `guid`, returning the previous value.
    ///
    /// The replacement keeps the old statement's position and may itself
    /// carry a different GUID.
    pub fn replace_at_guid(&mut self, guid: &str, statement: Statement) -> Option<Statement> {
        let slot = self.0.iter_mut().find(|s| s.guid() == Some(guid))?;
        Some(std::mem::replace(slot, statement))
    }

    /// Re-own every statement to a new owner, drawing fresh GUID suffixes.
    pub fn re_owned(&self, owner: &str) -> Self {
        Self(self.0.iter().map(|s| s.re_owned(owner)).collect())
    }

    /// Whether any statement value references the given serialized id.
    pub fn references_entity(&self, serialized_id: &str) -> bool {
        self.0.iter().any(|s| s.references_entity(serialized_id))
    }

    /// Iterate statements in list order.
    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a StatementList {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
