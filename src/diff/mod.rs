//! diff
//!
//! Tree-shaped deltas between two entity snapshots, and their replay.
//!
//! # Modules
//!
//! - [`ops`] - Diff value objects: per-field sub-diffs composed into
//!   [`ops::LexemeDiff`], [`ops::FormDiff`] and [`ops::SenseDiff`]
//! - [`differ`] - Computes the delta between two snapshots of the same kind
//! - [`patcher`] - Replays a delta onto a snapshot with conflict detection
//!
//! # Invariants
//!
//! - The differ performs no I/O and mutates nothing
//! - `patch(a, diff(a, b))` is structurally equal to `b`
//! - `diff(a, a)` is empty
//! - Every patch operation carries the expected old value; a mismatch fails
//!   with [`patcher::PatchError::Conflict`] instead of silently overwriting
//!
//! Diffs are transient: they are computed, applied or merged, and dropped.
//! They serialize (for the CLI and for previewing) but are never persisted
//! as a source of truth.

pub mod differ;
pub mod ops;
pub mod patcher;

pub use differ::{diff_forms_of, diff_lexemes, diff_senses_of, DiffError};
pub use ops::{FormDiff, LexemeDiff, SenseDiff};
pub use patcher::{patch_form, patch_lexeme, patch_sense, PatchError};
