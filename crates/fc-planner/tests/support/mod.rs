//! Shared test command type for the scenario and property test suites.

#![allow(dead_code)]

use std::convert::TryFrom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fc_planner::{Command, CommandTag, ConflictKey, GroupSlot};

/// A minimal command: just enough payload (an id, for assertions) plus what
/// the `Command` trait requires.
pub struct Job {
    pub id: u64,
    tag: CommandTag,
    group: GroupSlot,
    conflict_key: Option<ConflictKey>,
}

static NEXT_TERMINATION_ID: AtomicU64 = AtomicU64::new(1_000_000_000);

impl Job {
    pub fn new(id: u64, tag: CommandTag) -> Arc<Job> {
        Arc::new(Job {
            id,
            tag,
            group: GroupSlot::default(),
            conflict_key: None,
        })
    }

    pub fn with_conflict_key(id: u64, tag: CommandTag, key: &str) -> Arc<Job> {
        Arc::new(Job {
            id,
            tag,
            group: GroupSlot::default(),
            conflict_key: Some(ConflictKey::try_from(key).expect("valid test conflict key")),
        })
    }
}

impl Command for Job {
    fn tag(&self) -> CommandTag {
        self.tag
    }

    fn group_slot(&self) -> &GroupSlot {
        &self.group
    }

    fn conflict_key(&self) -> Option<ConflictKey> {
        self.conflict_key.clone()
    }

    fn termination() -> Self {
        Job {
            id: NEXT_TERMINATION_ID.fetch_add(1, Ordering::Relaxed),
            tag: CommandTag::Die,
            group: GroupSlot::default(),
            conflict_key: None,
        }
    }
}
