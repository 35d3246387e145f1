//! core::terms
//!
//! Term lists and item references.
//!
//! A [`TermList`] maps language codes to term text. It preserves insertion
//! order (so serializations round-trip byte-identically) while enforcing at
//! most one term per language. Empty term text is never stored; absence of a
//! term is the only representation of "no text".
//!
//! An [`ItemReference`] points at an externally defined concept entity (a
//! language, a lexical category, a grammatical feature). The core treats it
//! as an opaque comparable value ordered by its serialization.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors from term and reference validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TermError {
    #[error("term language code cannot be empty")]
    EmptyLanguage,

    #[error("term text cannot be empty; absent terms represent empty text")]
    EmptyText,

    #[error("item reference cannot be empty")]
    EmptyReference,
}

/// A single term: a language code and its text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTerm")]
pub struct Term {
    language: String,
    value: String,
}

/// Unvalidated wire shape of a term.
#[derive(Deserialize)]
struct RawTerm {
    language: String,
    value: String,
}

impl TryFrom<RawTerm> for Term {
    type Error = TermError;

    fn try_from(raw: RawTerm) -> Result<Self, Self::Error> {
        Term::new(raw.language, raw.value)
    }
}

impl Term {
    /// Create a validated term.
    ///
    /// # Errors
    ///
    /// Returns `TermError::EmptyLanguage` or `TermError::EmptyText` when the
    /// respective component is empty.
    pub fn new(language: impl Into<String>, value: impl Into<String>) -> Result<Self, TermError> {
        let language = language.into();
        let value = value.into();
        if language.is_empty() {
            return Err(TermError::EmptyLanguage);
        }
        if value.is_empty() {
            return Err(TermError::EmptyText);
        }
        Ok(Self { language, value })
    }

    /// The language code.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The term text.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// An ordered collection of terms with at most one term per language.
///
/// Insertion order is preserved but carries no meaning for diffing or
/// equality of the wider entity model beyond "term lists compare in order".
/// Writing a language that is already present replaces the previous text.
///
/// # Example
///
/// ```
/// use lexmerge::core::terms::{Term, TermList};
///
/// let mut lemmas = TermList::new();
/// lemmas.put(Term::new("en", "cat").unwrap());
/// lemmas.put(Term::new("en", "cats").unwrap());
/// assert_eq!(lemmas.len(), 1);
/// assert_eq!(lemmas.text_for("en"), Some("cats"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TermList(Vec<Term>);

impl TermList {
    /// Create an empty term list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a term list from terms, applying the replace-on-duplicate policy.
    pub fn from_terms(terms: impl IntoIterator<Item = Term>) -> Self {
        let mut list = Self::new();
        for term in terms {
            list.put(term);
        }
        list
    }

    /// Insert a term, replacing any existing term in the same language.
    pub fn put(&mut self, term: Term) {
        match self.0.iter_mut().find(|t| t.language == term.language) {
            Some(existing) => existing.value = term.value,
            None => self.0.push(term),
        }
    }

    /// Insert a term at `index`, clamped to the list length. If the
    /// language is already present the existing entry is replaced in place
    /// and keeps its position.
    pub fn insert(&mut self, index: usize, term: Term) {
        match self.0.iter_mut().find(|t| t.language == term.language) {
            Some(existing) => existing.value = term.value,
            None => self.0.insert(index.min(self.0.len()), term),
        }
    }

    /// Remove and return the term for a language, if present.
    pub fn remove(&mut self, language: &str) -> Option<Term> {
        let idx = self.0.iter().position(|t| t.language == language)?;
        Some(self.0.remove(idx))
    }

    /// The text for a language, if present.
    pub fn text_for(&self, language: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|t| t.language == language)
            .map(|t| t.value.as_str())
    }

    /// Whether a language has a term.
    pub fn has_language(&self, language: &str) -> bool {
        self.text_for(language).is_some()
    }

    /// Iterate terms in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.0.iter()
    }

    /// The languages present, in insertion order.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|t| t.language.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for TermList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let terms = Vec::<Term>::deserialize(deserializer)?;
        let mut seen: Vec<&str> = Vec::with_capacity(terms.len());
        for term in &terms {
            if seen.contains(&term.language.as_str()) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate language '{}' in term list",
                    term.language
                )));
            }
            seen.push(&term.language);
        }
        Ok(Self(terms))
    }
}

impl<'a> IntoIterator for &'a TermList {
    type Item = &'a Term;
    type IntoIter = std::slice::Iter<'a, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A reference to an externally defined concept entity.
///
/// Opaque to this core: two references are equal iff their serializations
/// are equal, and they order by serialization so feature sets sort
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemReference(String);

impl ItemReference {
    /// Create a validated item reference.
    ///
    /// # Errors
    ///
    /// Returns `TermError::EmptyReference` for an empty serialization.
    pub fn new(serialization: impl Into<String>) -> Result<Self, TermError> {
        let serialization = serialization.into();
        if serialization.is_empty() {
            return Err(TermError::EmptyReference);
        }
        Ok(Self(serialization))
    }

    /// Get the serialization as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemReference {
    type Error = TermError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ItemReference> for String {
    fn from(r: ItemReference) -> Self {
        r.0
    }
}

impl std::fmt::Display for ItemReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
