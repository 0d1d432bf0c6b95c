//! Command shape: the type tag, mutable group slot and optional conflict key
//! the planner needs, decoupled from whatever payload a producer attaches.

use std::collections::HashSet;
use std::convert::TryFrom;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::PlannerError;
use crate::group::GroupId;

/// The closed set of command type tags the group-assignment and ASAP-routing
/// policies dispatch on.
///
/// `Other` is the catch-all for any grouped command type a producer defines
/// that isn't named in the source policy tables; per the error-handling
/// design it is treated exactly like any other ungrouped-by-name command
/// (Family C, never closes the forming group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTag {
    // Family A: ASAP lane.
    ProcessEvent,
    EntrypointRequest,
    HaNvecGet,
    HaNvecSet,
    // Family B: termination, joined to the backlog via the Family C rules.
    Die,
    // Family C: grouped, with special closing rules.
    ProcessHaEvent,
    BroadcastHaStates,
    SnsOperation,
    // Family C: grouped, status/reply commands and anything else, no
    // special closing behavior.
    SnsStatus,
    Other,
}

/// Which queue and grouping discipline a tag is subject to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Asap,
    Grouped,
}

impl CommandTag {
    pub(crate) fn family(self) -> Family {
        match self {
            CommandTag::ProcessEvent
            | CommandTag::EntrypointRequest
            | CommandTag::HaNvecGet
            | CommandTag::HaNvecSet => Family::Asap,
            _ => Family::Grouped,
        }
    }

    /// Whether admitting `self` to the forming group should first close it
    /// (rotate `next_group_id` and clear the admitted-tags set), given the
    /// tags already admitted to that group.
    ///
    /// This is the complete §4.2 policy table, kept as a pure function so it
    /// can be unit tested without touching the lock-guarded planner state.
    pub(crate) fn should_close_forming_group(self, next_group_commands: &HashSet<CommandTag>) -> bool {
        match self {
            CommandTag::ProcessHaEvent | CommandTag::BroadcastHaStates => {
                !next_group_commands.is_empty()
            }
            CommandTag::SnsOperation => next_group_commands.contains(&CommandTag::SnsOperation),
            _ => false,
        }
    }
}

/// An ASAP conflict key: commands sharing one may never be active at the
/// same time. In the source this is the process identifier of a
/// process-scoped event; here it's an opaque interned string so any
/// collaborator's identity scheme can be carried without the planner
/// understanding its structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConflictKey(Arc<str>);

/// Conflict keys longer than this are rejected by [`ConflictKey::try_from`]
/// as a defensive bound against unbounded input from untrusted producers
/// (e.g. a malformed process identifier arriving over HTTP).
const MAX_CONFLICT_KEY_LEN: usize = 256;

impl TryFrom<&str> for ConflictKey {
    type Error = PlannerError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        if raw.is_empty() || raw.len() > MAX_CONFLICT_KEY_LEN {
            return Err(PlannerError::InvalidConflictKey(raw.to_string()));
        }
        Ok(ConflictKey(Arc::from(raw)))
    }
}

impl TryFrom<String> for ConflictKey {
    type Error = PlannerError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        ConflictKey::try_from(raw.as_str())
    }
}

impl std::fmt::Display for ConflictKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mutable group-id slot every command carries.
///
/// The planner assigns a command's group at `submit` time and never again;
/// `AtomicU32` rather than `Cell` gives the slot a `Sync` bound so commands
/// can be shared via `Arc` across producer and worker threads.
#[derive(Debug)]
pub struct GroupSlot(AtomicU32);

impl GroupSlot {
    pub fn new(group: GroupId) -> Self {
        GroupSlot(AtomicU32::new(group.value()))
    }

    pub fn get(&self) -> GroupId {
        GroupId::from_raw(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, group: GroupId) {
        self.0.store(group.value(), Ordering::Release);
    }
}

impl Default for GroupSlot {
    fn default() -> Self {
        GroupSlot::new(GroupId::ZERO)
    }
}

/// What the planner needs from a producer's command type.
///
/// The planner never copies a command and never inspects its payload; it
/// only needs a type tag, a mutable group slot, and an optional conflict
/// key. Commands are shared between the submitting producer and the
/// executing worker as `Arc<C>`; the allocation's address is the "reference
/// identity" the source design calls for in its active-set bookkeeping, so
/// no separate handle needs to be minted.
pub trait Command: Send + Sync + 'static {
    /// The type tag driving ASAP routing and group-assignment policy.
    fn tag(&self) -> CommandTag;

    /// The mutable group-id slot the planner assigns at `submit` time.
    fn group_slot(&self) -> &GroupSlot;

    /// The optional ASAP conflict key. Commands with no conflict key are
    /// always ASAP-eligible.
    fn conflict_key(&self) -> Option<ConflictKey> {
        None
    }

    /// Construct a fresh termination ("poison pill") command.
    ///
    /// Called by the planner while draining; the result is tracked like any
    /// other active command and must still be `complete`d by the worker
    /// that receives it.
    fn termination() -> Self
    where
        Self: Sized;
}
