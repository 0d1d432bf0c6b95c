//! The planner's single configuration knob.
//!
//! Per the source design, the planner takes no runtime configuration beyond
//! the cyclic group-id bound, and that bound is a compile-time constant in
//! production. [`PlannerConfig`] still exposes a fallible constructor so a
//! future caller-supplied bound has somewhere to report an invalid value
//! without changing the public API.

use crate::error::PlannerError;
use crate::group::MAX_GROUP_ID;

/// Configuration for a [`crate::Planner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    max_group_id: u32,
}

impl PlannerConfig {
    /// Build a config with a custom group-id wrap bound.
    ///
    /// Returns [`PlannerError::InvalidGroupBound`] if `max_group_id` is zero
    /// (a zero bound would make every group id collapse to `0`, defeating
    /// the point of a wrapping counter).
    pub fn new(max_group_id: u32) -> Result<Self, PlannerError> {
        if max_group_id == 0 {
            return Err(PlannerError::InvalidGroupBound(max_group_id));
        }
        Ok(Self { max_group_id })
    }

    pub fn max_group_id(&self) -> u32 {
        self.max_group_id
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_group_id: MAX_GROUP_ID,
        }
    }
}
