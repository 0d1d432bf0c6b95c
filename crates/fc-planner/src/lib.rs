//! A thread-safe work planner: the coordinator that accepts a stream of
//! heterogeneous command messages from producer threads and dispenses them
//! to a pool of worker threads under group-ordering, conflict-detection and
//! ASAP fast-path rules.
//!
//! This crate implements only the coordinator. It does not know how to
//! decode a command's payload, call out to a downstream store, or listen on
//! a socket — those are the job of whatever binary wires a [`Planner`] up to
//! real producers and workers. See `fc-planner-demo` for a worked example of
//! that wiring.
//!
//! ```
//! use std::sync::Arc;
//! use fc_planner::{Command, CommandTag, GroupSlot, Planner};
//!
//! struct Job {
//!     tag: CommandTag,
//!     group: GroupSlot,
//! }
//!
//! impl Command for Job {
//!     fn tag(&self) -> CommandTag {
//!         self.tag
//!     }
//!
//!     fn group_slot(&self) -> &GroupSlot {
//!         &self.group
//!     }
//!
//!     fn termination() -> Self {
//!         Job {
//!             tag: CommandTag::Die,
//!             group: GroupSlot::default(),
//!         }
//!     }
//! }
//!
//! let planner: Planner<Job> = Planner::new();
//! planner.submit(Arc::new(Job {
//!     tag: CommandTag::BroadcastHaStates,
//!     group: GroupSlot::default(),
//! }));
//!
//! let cmd = planner.take();
//! // ... execute cmd ...
//! planner.complete(&cmd);
//! ```

mod command;
mod config;
mod error;
mod group;
mod planner;

pub use command::{Command, CommandTag, ConflictKey, GroupSlot};
pub use config::PlannerConfig;
pub use error::PlannerError;
pub use group::{GroupId, MAX_GROUP_ID};
pub use planner::Planner;
