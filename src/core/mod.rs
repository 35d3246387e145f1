//! core
//!
//! Core domain types for lexicographical entities.
//!
//! # Modules
//!
//! - [`ids`] - Identity model: LexemeId, FormId, SenseId and their composite encoding
//! - [`terms`] - Term lists and item references
//! - [`statements`] - Owner-scoped statements and statement lists
//! - [`lexeme`] - The Lexeme/Form/Sense entity model
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Entities are plain owned data; a clone never aliases its original
//! - All normalization (feature dedup and sort, term uniqueness) happens at
//!   the mutation site, so snapshots are always canonical

pub mod ids;
pub mod lexeme;
pub mod statements;
pub mod terms;
