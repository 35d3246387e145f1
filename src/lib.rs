//! Lexmerge - structural diff, patch and merge for lexicographical entities
//!
//! Lexmerge models a hierarchical lexicographical entity (a Lexeme with its
//! Forms and Senses), computes tree-shaped deltas between two snapshots of
//! such an entity, replays those deltas, and merges two independently edited
//! copies while detecting true conflicts.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the library)
//! - [`core`] - Identity model, entity model, term lists, statements
//! - [`diff`] - Diff value objects, the structural differ and patcher
//! - [`merge`] - Merge engine with up-front precondition validation
//! - [`changeop`] - Validated, composable change operations
//! - [`store`] - Storage boundary with optimistic-concurrency revisions
//!
//! # Correctness Invariants
//!
//! Lexmerge maintains the following invariants:
//!
//! 1. Sub-entity identity is derivable from its components; equality never
//!    falls back to string comparison
//! 2. `patch(a, diff(a, b))` is structurally equal to `b`
//! 3. A merge either completes all of its steps or mutates nothing
//! 4. Change operations validate before they mutate

pub mod changeop;
pub mod cli;
pub mod core;
pub mod diff;
pub mod merge;
pub mod store;
