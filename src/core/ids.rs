//! core::ids
//!
//! Identity model for lexicographical entities.
//!
//! # Types
//!
//! - [`LexemeId`] - Validated root entity identifier (`L<digits>`)
//! - [`FormId`] / [`SenseId`] - Composite sub-entity identifiers
//! - [`FormIdState`] / [`SenseIdState`] - Three-state identity for blank sub-entities
//!
//! # Encoding
//!
//! A sub-entity id is the pair `(parent, localId)` with a type tag (`F` for
//! forms, `S` for senses). Its canonical serialization is
//! `<LexemeId>-<Tag><localId>`, e.g. `L7-F3`. [`compose_sub_entity_id`] and
//! [`parse_sub_entity_id`] are the single source of truth for that rule, so
//! construction and parsing are provably inverse.
//!
//! Equality is always by components, never by string comparison.
//!
//! # Examples
//!
//! ```
//! use lexmerge::core::ids::{FormId, LexemeId, SenseId};
//!
//! let lexeme = LexemeId::new("L7").unwrap();
//! let form = FormId::new(lexeme.clone(), 3).unwrap();
//! assert_eq!(form.to_string(), "L7-F3");
//! assert_eq!(FormId::parse("L7-F3").unwrap(), form);
//!
//! // Invalid constructions fail at creation time
//! assert!(LexemeId::new("Q7").is_err());
//! assert!(SenseId::parse("L7-F3").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from identity validation and access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid id format: {0}")]
    InvalidIdFormat(String),

    #[error("id of a blank {0} was read before it was assigned")]
    Unassigned(&'static str),

    #[error("id is already assigned and immutable")]
    AlreadyAssigned,

    #[error("sub-entity id belongs to a different parent")]
    WrongParent,
}

/// The type tag of a sub-entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IdTag {
    Form,
    Sense,
}

impl IdTag {
    /// The single-letter tag used in serializations.
    pub fn letter(self) -> char {
        match self {
            IdTag::Form => 'F',
            IdTag::Sense => 'S',
        }
    }

    fn entity_name(self) -> &'static str {
        match self {
            IdTag::Form => "form",
            IdTag::Sense => "sense",
        }
    }
}

/// A validated Lexeme identifier.
///
/// Serializations match `L<digits>` with no leading zero. Ids are assigned
/// at creation, globally unique, and immutable once assigned.
///
/// # Example
///
/// ```
/// use lexmerge::core::ids::LexemeId;
///
/// let id = LexemeId::new("L42").unwrap();
/// assert_eq!(id.as_str(), "L42");
/// assert_eq!(id.number(), 42);
///
/// assert!(LexemeId::new("L0").is_err());
/// assert!(LexemeId::new("L01").is_err());
/// assert!(LexemeId::new("l7").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LexemeId(String);

impl LexemeId {
    /// Create a new validated lexeme id.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidIdFormat` if the string does not match
    /// `L<digits>` (positive, no leading zero).
    pub fn new(serialization: impl Into<String>) -> Result<Self, IdError> {
        let serialization = serialization.into();
        Self::validate(&serialization)?;
        Ok(Self(serialization))
    }

    /// Create a lexeme id from its numeric part.
    pub fn from_number(n: u64) -> Result<Self, IdError> {
        if n == 0 {
            return Err(IdError::InvalidIdFormat(
                "lexeme id number must be positive".into(),
            ));
        }
        Ok(Self(format!("L{n}")))
    }

    fn validate(serialization: &str) -> Result<(), IdError> {
        let digits = serialization.strip_prefix('L').ok_or_else(|| {
            IdError::InvalidIdFormat(format!("expected 'L' prefix in '{serialization}'"))
        })?;
        parse_local_number(digits)
            .map_err(|_| IdError::InvalidIdFormat(format!("bad lexeme id '{serialization}'")))?;
        Ok(())
    }

    /// Get the serialization as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric part of the id.
    pub fn number(&self) -> u64 {
        // Validated at construction: 'L' followed by digits that fit u64.
        self.0[1..].parse().unwrap_or(0)
    }
}

impl PartialOrd for LexemeId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LexemeId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.number().cmp(&other.number())
    }
}

impl TryFrom<String> for LexemeId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LexemeId> for String {
    fn from(id: LexemeId) -> Self {
        id.0
    }
}

impl AsRef<str> for LexemeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LexemeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compose the canonical serialization of a sub-entity id.
///
/// This is the single source of truth for the `<LexemeId>-<Tag><localId>`
/// rule; [`parse_sub_entity_id`] inverts it exactly.
pub fn compose_sub_entity_id(parent: &LexemeId, tag: IdTag, local_id: u32) -> String {
    format!("{}-{}{}", parent.as_str(), tag.letter(), local_id)
}

/// Parse a sub-entity serialization back into its `(parent, localId)` pair.
///
/// # Errors
///
/// Returns `IdError::InvalidIdFormat` if the separator, tag letter or
/// numeric suffix do not match `expected_tag`.
pub fn parse_sub_entity_id(
    serialization: &str,
    expected_tag: IdTag,
) -> Result<(LexemeId, u32), IdError> {
    let bad = || IdError::InvalidIdFormat(format!("bad sub-entity id '{serialization}'"));

    let (parent_part, local_part) = serialization.split_once('-').ok_or_else(bad)?;
    let parent = LexemeId::new(parent_part)?;

    let digits = local_part
        .strip_prefix(expected_tag.letter())
        .ok_or_else(|| {
            IdError::InvalidIdFormat(format!(
                "expected tag '{}' in '{serialization}'",
                expected_tag.letter()
            ))
        })?;
    let local_id = parse_local_number(digits).map_err(|_| bad())?;
    if local_id > u64::from(u32::MAX) {
        return Err(bad());
    }

    Ok((parent, local_id as u32))
}

/// Parse a positive decimal with no leading zero.
fn parse_local_number(digits: &str) -> Result<u64, ()> {
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(());
    }
    digits.parse().map_err(|_| ())
}

macro_rules! sub_entity_id {
    ($name:ident, $state:ident, $tag:expr, $doc:literal) => {
        #[doc = $doc]
        ///
        /// Holds the `(parent, localId)` pair; the serialization is always
        /// re-derived from the components via [`compose_sub_entity_id`].
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name {
            parent: LexemeId,
            local_id: u32,
        }

        impl $name {
            /// Create an id from its components.
            ///
            /// # Errors
            ///
            /// Returns `IdError::InvalidIdFormat` if `local_id` is zero.
            pub fn new(parent: LexemeId, local_id: u32) -> Result<Self, IdError> {
                if local_id == 0 {
                    return Err(IdError::InvalidIdFormat(
                        "local id must be positive".into(),
                    ));
                }
                Ok(Self { parent, local_id })
            }

            /// Parse a canonical serialization.
            pub fn parse(serialization: &str) -> Result<Self, IdError> {
                let (parent, local_id) = parse_sub_entity_id(serialization, $tag)?;
                Self::new(parent, local_id)
            }

            /// The owning lexeme's id.
            pub fn parent(&self) -> &LexemeId {
                &self.parent
            }

            /// The local number, unique within the parent.
            pub fn local_id(&self) -> u32 {
                self.local_id
            }

            /// The canonical serialization.
            pub fn serialization(&self) -> String {
                compose_sub_entity_id(&self.parent, $tag, self.local_id)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                (&self.parent, self.local_id).cmp(&(&other.parent, other.local_id))
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.serialization()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.serialization())
            }
        }

        /// Identity state of a possibly-blank sub-entity.
        ///
        /// A blank sub-entity starts `Unattached`. Attaching it to a lexeme
        /// that already has a permanent id moves it to `Pending`, a
        /// prediction-only placeholder carrying the parent reference but no
        /// local number. The permanent id arrives at save time as `Assigned`.
        ///
        /// Reading the real id off any non-`Assigned` state fails loudly
        /// rather than returning a default.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $state {
            /// Blank, not yet attached to any parent.
            Unattached,
            /// Attached to a saved parent; local number not yet drawn.
            /// Never persisted or compared as a real id.
            Pending(LexemeId),
            /// Permanent id.
            Assigned($name),
        }

        impl $state {
            /// The permanent id.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Unassigned` unless the state is `Assigned`.
            pub fn assigned(&self) -> Result<&$name, IdError> {
                match self {
                    $state::Assigned(id) => Ok(id),
                    _ => Err(IdError::Unassigned($tag.entity_name())),
                }
            }

            /// The parent reference, if one is known.
            pub fn parent(&self) -> Option<&LexemeId> {
                match self {
                    $state::Unattached => None,
                    $state::Pending(parent) => Some(parent),
                    $state::Assigned(id) => Some(id.parent()),
                }
            }

            /// Whether a permanent id has been assigned.
            pub fn is_assigned(&self) -> bool {
                matches!(self, $state::Assigned(_))
            }

            /// Predict the id that would be assigned for `local_id`.
            ///
            /// Only meaningful on `Pending`; the result must not be treated
            /// as a real id until the parent is saved.
            pub fn predict(&self, local_id: u32) -> Result<$name, IdError> {
                match self {
                    $state::Pending(parent) => $name::new(parent.clone(), local_id),
                    _ => Err(IdError::Unassigned($tag.entity_name())),
                }
            }
        }
    };
}

sub_entity_id!(FormId, FormIdState, IdTag::Form, "A composite Form identifier.");
sub_entity_id!(SenseId, SenseIdState, IdTag::Sense, "A composite Sense identifier.");
