//! Fallible boundaries of the planner crate.
//!
//! The coordinator's five operations (`submit`, `take`, `complete`, `drain`,
//! `empty`) never fail: they do no I/O, allocate no unbounded buffers, and
//! parse nothing. The only fallible surface sits at construction time, where
//! collaborators hand the planner values it must validate before trusting
//! them.

use thiserror::Error;

/// Errors raised at the planner's construction boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlannerError {
    /// A configured group-id bound was out of range.
    ///
    /// `MAX_GROUP_ID` is fixed at compile time today, so this variant has no
    /// live caller; it exists so a future runtime-configurable bound has
    /// somewhere to report rejection without a breaking API change.
    #[error("invalid group id bound: {0} (must be >= 1)")]
    InvalidGroupBound(u32),

    /// A conflict key minted from untrusted input (e.g. a process identifier
    /// decoded from an HTTP payload) failed validation.
    #[error("invalid conflict key: {0:?}")]
    InvalidConflictKey(String),
}
