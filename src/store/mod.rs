//! store
//!
//! The entity storage boundary.
//!
//! The diff/merge/change-operation core never persists anything itself; it
//! consumes snapshots from an [`EntityStore`] and hands results back under
//! an optimistic-concurrency contract: every save carries the revision the
//! caller started from, and a stale base fails with
//! [`StoreError::EditConflict`] instead of overwriting a concurrent edit.
//!
//! [`MemoryStore`] is the in-process implementation. It assigns permanent
//! lexeme ids and pending form/sense local ids at save time, and
//! fingerprints each revision over its canonical JSON
//! serialization so divergence is detectable without comparing full
//! snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::ids::{IdError, LexemeId};
use crate::core::lexeme::Lexeme;

/// Errors from the storage boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The caller's base revision is stale; re-fetch and redo the edit.
    #[error("edit conflict: base revision {base} is stale, current is {current}")]
    EditConflict { base: RevisionId, current: RevisionId },

    /// Saving against a base revision of a lexeme the store has never seen.
    #[error("unknown lexeme {0}")]
    UnknownLexeme(LexemeId),

    /// Saving an existing lexeme without a base revision.
    #[error("saving an existing lexeme requires its base revision")]
    MissingBaseRevision,

    #[error(transparent)]
    Id(#[from] IdError),

    #[error("failed to serialize lexeme: {0}")]
    Serialize(String),
}

/// A monotonically increasing revision identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(u64);

impl RevisionId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RevisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A stable hash over a lexeme's canonical serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a lexeme snapshot.
    pub fn compute(lexeme: &Lexeme) -> Result<Self, StoreError> {
        let bytes =
            serde_json::to_vec(lexeme).map_err(|e| StoreError::Serialize(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The storage contract the core is written against.
pub trait EntityStore {
    /// Load a snapshot and the revision it was read at. Not-found is an
    /// explicit value, not an error.
    fn load(&self, id: &LexemeId) -> Option<(Lexeme, RevisionId)>;

    /// Persist a snapshot.
    ///
    /// A lexeme without an id is created: it receives a fresh permanent id
    /// and `base` must be `None`. An identified lexeme the store already
    /// holds is updated only if `base` matches its current revision; one it
    /// has never seen is seeded as its first revision, again with `base` of
    /// `None`. Pending children receive their permanent local ids as part
    /// of the save.
    fn save(
        &mut self,
        lexeme: Lexeme,
        base: Option<RevisionId>,
    ) -> Result<(LexemeId, RevisionId), StoreError>;
}

#[derive(Debug, Clone)]
struct StoredRevision {
    lexeme: Lexeme,
    revision: RevisionId,
    fingerprint: Fingerprint,
    saved_at: DateTime<Utc>,
}

/// In-memory entity storage with optimistic concurrency.
///
/// # Example
///
/// ```
/// use lexmerge::core::lexeme::Lexeme;
/// use lexmerge::core::terms::Term;
/// use lexmerge::store::{EntityStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// let mut lexeme = Lexeme::blank();
/// lexeme.lemmas_mut().put(Term::new("en", "cat").unwrap());
///
/// let (id, rev) = store.save(lexeme, None).unwrap();
/// let (loaded, loaded_rev) = store.load(&id).unwrap();
/// assert_eq!(loaded_rev, rev);
/// assert_eq!(loaded.id(), Some(&id));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: HashMap<LexemeId, StoredRevision>,
    next_lexeme_number: u64,
    next_revision: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_lexeme_number: 1,
            next_revision: 1,
        }
    }

    /// The fingerprint of the current revision, if the lexeme exists.
    pub fn fingerprint(&self, id: &LexemeId) -> Option<&Fingerprint> {
        self.entities.get(id).map(|s| &s.fingerprint)
    }

    /// When the current revision was saved, if the lexeme exists.
    pub fn saved_at(&self, id: &LexemeId) -> Option<DateTime<Utc>> {
        self.entities.get(id).map(|s| s.saved_at)
    }

    fn fresh_lexeme_id(&mut self) -> Result<LexemeId, StoreError> {
        let id = LexemeId::from_number(self.next_lexeme_number)?;
        self.next_lexeme_number += 1;
        Ok(id)
    }

    fn fresh_revision(&mut self) -> RevisionId {
        let rev = RevisionId(self.next_revision);
        self.next_revision += 1;
        rev
    }
}

impl EntityStore for MemoryStore {
    fn load(&self, id: &LexemeId) -> Option<(Lexeme, RevisionId)> {
        self.entities
            .get(id)
            .map(|stored| (stored.lexeme.clone(), stored.revision))
    }

    fn save(
        &mut self,
        mut lexeme: Lexeme,
        base: Option<RevisionId>,
    ) -> Result<(LexemeId, RevisionId), StoreError> {
        let id = match lexeme.id() {
            Some(id) => match self.entities.get(id) {
                Some(stored) => {
                    let base = base.ok_or(StoreError::MissingBaseRevision)?;
                    if base != stored.revision {
                        return Err(StoreError::EditConflict {
                            base,
                            current: stored.revision,
                        });
                    }
                    id.clone()
                }
                // First save of an externally identified snapshot seeds it;
                // fresh ids must never collide with the seeded number.
                None => {
                    if base.is_some() {
                        return Err(StoreError::UnknownLexeme(id.clone()));
                    }
                    self.next_lexeme_number =
                        self.next_lexeme_number.max(id.number().saturating_add(1));
                    id.clone()
                }
            },
            None => {
                let id = self.fresh_lexeme_id()?;
                lexeme.assign_id(id.clone())?;
                id
            }
        };

        lexeme.assign_child_ids()?;
        let revision = self.fresh_revision();
        let fingerprint = Fingerprint::compute(&lexeme)?;
        self.entities.insert(
            id.clone(),
            StoredRevision {
                lexeme,
                revision,
                fingerprint,
                saved_at: Utc::now(),
            },
        );
        Ok((id, revision))
    }
}
