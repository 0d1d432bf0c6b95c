//! The coordinator itself: one lock, one condition variable, five
//! operations.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::command::{Command, CommandTag, ConflictKey, Family};
use crate::config::PlannerConfig;
use crate::group::GroupId;

/// An active command paired with the conflict key it was dispatched with
/// (computed once, at dispatch time, so `complete` never has to re-derive
/// it from a command that might already be half torn-down by the caller).
struct ActiveEntry<C> {
    command: Arc<C>,
    conflict_key: Option<ConflictKey>,
}

struct State<C> {
    current_group_id: GroupId,
    next_group_id: GroupId,
    next_group_commands: HashSet<CommandTag>,
    backlog: VecDeque<Arc<C>>,
    asap: VecDeque<Arc<C>>,
    active: Vec<ActiveEntry<C>>,
    shutting_down: bool,
}

impl<C> State<C> {
    fn new() -> Self {
        State {
            current_group_id: GroupId::ZERO,
            next_group_id: GroupId::ZERO,
            next_group_commands: HashSet::new(),
            backlog: VecDeque::new(),
            asap: VecDeque::new(),
            active: Vec::new(),
            shutting_down: false,
        }
    }
}

struct Inner<C> {
    state: Mutex<State<C>>,
    condvar: Condvar,
    config: PlannerConfig,
}

/// A thread-safe work planner.
///
/// `Planner<C>` is cheap to clone (it's an `Arc` handle internally) and is
/// meant to be shared between any number of producer threads calling
/// [`Planner::submit`] and worker threads looping on
/// [`Planner::take`]/[`Planner::complete`]. See the crate docs for the full
/// protocol.
pub struct Planner<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for Planner<C> {
    fn clone(&self) -> Self {
        Planner {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Command> Planner<C> {
    /// Build a planner with the default configuration (`MAX_GROUP_ID` from
    /// the source system).
    pub fn new() -> Self {
        Self::with_config(PlannerConfig::default())
    }

    /// Build a planner with a custom [`PlannerConfig`].
    pub fn with_config(config: PlannerConfig) -> Self {
        Planner {
            inner: Arc::new(Inner {
                state: Mutex::new(State::new()),
                condvar: Condvar::new(),
                config,
            }),
        }
    }

    /// Queue a command for dispatch.
    ///
    /// Blocks only to acquire the internal lock; never waits for the
    /// command to actually be taken or executed.
    pub fn submit(&self, command: Arc<C>) {
        let tag = command.tag();
        let max = self.inner.config.max_group_id();

        let mut state = self.inner.state.lock();
        match tag.family() {
            Family::Asap => {
                command.group_slot().set(state.current_group_id);
                state.asap.push_back(command);
            }
            Family::Grouped => {
                if tag.should_close_forming_group(&state.next_group_commands) {
                    state.next_group_id = state.next_group_id.successor(max);
                    state.next_group_commands.clear();
                }
                let group = state.next_group_id;
                command.group_slot().set(group);
                state.next_group_commands.insert(tag);
                state.backlog.push_back(command);
            }
        }
        drop(state);
        self.inner.condvar.notify_all();
    }

    /// Block until a command is eligible to run, then return it.
    ///
    /// Returns a synthetic termination command once [`Planner::drain`] has
    /// been called; every subsequent call does the same, forever.
    pub fn take(&self) -> Arc<C> {
        let mut state = self.inner.state.lock();
        loop {
            if state.shutting_down {
                let group = state.current_group_id;
                let command = Arc::new(C::termination());
                command.group_slot().set(group);
                state.active.push(ActiveEntry {
                    command: Arc::clone(&command),
                    conflict_key: None,
                });
                debug!(group = %group, "dispatching termination command");
                return command;
            }

            if let Some(candidate) = state.asap.pop_front() {
                let key = candidate.conflict_key();
                let eligible = match &key {
                    None => true,
                    Some(k) => !state
                        .active
                        .iter()
                        .any(|entry| entry.conflict_key.as_ref() == Some(k)),
                };
                if eligible {
                    state.active.push(ActiveEntry {
                        command: Arc::clone(&candidate),
                        conflict_key: key,
                    });
                    return candidate;
                }
                state.asap.push_front(candidate);
            }

            if let Some(candidate) = state.backlog.pop_front() {
                if candidate.group_slot().get() == state.current_group_id {
                    state.active.push(ActiveEntry {
                        command: Arc::clone(&candidate),
                        conflict_key: None,
                    });
                    return candidate;
                }
                state.backlog.push_front(candidate);
            }

            self.inner.condvar.wait(&mut state);
        }
    }

    /// Mark a command returned by [`Planner::take`] as finished, possibly
    /// advancing the active group and waking suspended workers.
    ///
    /// A command the planner does not recognize as active (including one
    /// already completed once) is silently ignored, beyond a debug-level
    /// log line; see the crate's error-handling design notes.
    pub fn complete(&self, command: &Arc<C>) {
        let max = self.inner.config.max_group_id();
        let mut state = self.inner.state.lock();

        let pos = state
            .active
            .iter()
            .position(|entry| Arc::ptr_eq(&entry.command, command));
        let Some(pos) = pos else {
            debug!("complete() called on a command not in the active set; ignoring");
            return;
        };
        state.active.remove(pos);

        if !state.active.is_empty() {
            return;
        }
        let old_current = state.current_group_id;
        let still_current = state
            .backlog
            .iter()
            .any(|c| c.group_slot().get() == old_current);
        if still_current {
            return;
        }

        state.current_group_id = old_current.successor(max);
        if old_current == state.next_group_id {
            state.next_group_id = state.current_group_id;
            state.next_group_commands.clear();
        }
        drop(state);
        self.inner.condvar.notify_all();
    }

    /// Begin orderly shutdown. Idempotent; safe to call from any thread,
    /// any number of times.
    pub fn drain(&self) {
        let mut state = self.inner.state.lock();
        state.shutting_down = true;
        drop(state);
        self.inner.condvar.notify_all();
    }

    /// Whether the normal backlog is empty. Advisory only: the ASAP lane is
    /// not considered, and the result is stale the instant the lock is
    /// released.
    pub fn empty(&self) -> bool {
        self.inner.state.lock().backlog.is_empty()
    }
}

impl<C: Command> Default for Planner<C> {
    fn default() -> Self {
        Self::new()
    }
}
