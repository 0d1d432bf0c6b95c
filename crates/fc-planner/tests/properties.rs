//! Property-style tests for the universal invariants of §8 in the design
//! doc, plus the round-trip/idempotence checks.

mod support;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use proptest::prelude::*;

use fc_planner::{Command, CommandTag, Planner, PlannerConfig, MAX_GROUP_ID};
use support::Job;

#[derive(Clone, Copy, Debug)]
enum TagKind {
    ProcessEvent(u8),
    Broadcast,
    SnsOperation,
    HaNvecGet,
    Other,
}

fn tag_kind_strategy() -> impl Strategy<Value = TagKind> {
    prop_oneof![
        (0u8..3).prop_map(TagKind::ProcessEvent),
        Just(TagKind::Broadcast),
        Just(TagKind::SnsOperation),
        Just(TagKind::HaNvecGet),
        Just(TagKind::Other),
    ]
}

fn job_for_kind(id: u64, kind: TagKind) -> Arc<Job> {
    match kind {
        TagKind::ProcessEvent(fid) => {
            Job::with_conflict_key(id, CommandTag::ProcessEvent, &format!("proc-{fid}"))
        }
        TagKind::Broadcast => Job::new(id, CommandTag::BroadcastHaStates),
        TagKind::SnsOperation => Job::new(id, CommandTag::SnsOperation),
        TagKind::HaNvecGet => Job::new(id, CommandTag::HaNvecGet),
        TagKind::Other => Job::new(id, CommandTag::Other),
    }
}

proptest! {
    // Invariants 1 & 2: no two concurrently-active commands share a
    // conflict key, and no two concurrently-active commands have groups
    // that are cyclic successors of each other.
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn invariant_no_conflicting_or_cross_group_overlap(ops in prop::collection::vec(tag_kind_strategy(), 1..40)) {
        let planner: Planner<Job> = Planner::new();
        let op_count = ops.len();
        for (i, kind) in ops.into_iter().enumerate() {
            planner.submit(job_for_kind(i as u64, kind));
        }

        // Shared view of "currently active": id -> (conflict key string, group).
        // `group` is only meaningful for backlog-origin commands; ASAP
        // commands are exempt from the group-overlap invariant (the design
        // doc's invariant 2 is about grouped dispatch only), so their
        // entries carry `None`.
        let active: Arc<Mutex<HashMap<u64, (Option<String>, Option<u32>)>>> = Arc::new(Mutex::new(HashMap::new()));
        let dispatch_seq = Arc::new(AtomicU64::new(0));
        // (submission id, dispatch sequence number) for grouped-family commands only.
        let grouped_dispatch_order: Arc<Mutex<Vec<(u64, u64)>>> = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..op_count)
            .map(|_| {
                let planner = planner.clone();
                let active = Arc::clone(&active);
                let dispatch_seq = Arc::clone(&dispatch_seq);
                let grouped_dispatch_order = Arc::clone(&grouped_dispatch_order);
                thread::spawn(move || {
                    let cmd = planner.take();
                    let key = cmd.conflict_key().map(|k| k.to_string());
                    let from_asap = matches!(cmd.tag(), CommandTag::ProcessEvent | CommandTag::HaNvecGet);
                    let group = if from_asap { None } else { Some(cmd.group_slot().get().value()) };

                    {
                        let mut guard = active.lock().unwrap();
                        if let Some(k) = &key {
                            prop_assert_no_conflict(&guard, k);
                        }
                        if let Some(g) = group {
                            prop_assert_no_adjacent_group(&guard, g);
                        }
                        guard.insert(cmd.id, (key, group));
                    }

                    if !from_asap {
                        let seq = dispatch_seq.fetch_add(1, Ordering::SeqCst);
                        grouped_dispatch_order.lock().unwrap().push((cmd.id, seq));
                    }

                    active.lock().unwrap().remove(&cmd.id);
                    planner.complete(&cmd);
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        // Invariant 3: within the grouped backlog, dispatch order follows
        // submission order (the backlog only ever pops its head).
        let mut order = grouped_dispatch_order.lock().unwrap().clone();
        order.sort_by_key(|(_, seq)| *seq);
        let dispatched_ids: Vec<u64> = order.into_iter().map(|(id, _)| id).collect();
        let mut sorted_ids = dispatched_ids.clone();
        sorted_ids.sort_unstable();
        prop_assert_eq!(dispatched_ids, sorted_ids);
    }
}

fn prop_assert_no_conflict(active: &HashMap<u64, (Option<String>, Option<u32>)>, key: &str) {
    for (existing_key, _) in active.values() {
        if existing_key.as_deref() == Some(key) {
            panic!("two active commands shared conflict key {key:?}");
        }
    }
}

fn prop_assert_no_adjacent_group(active: &HashMap<u64, (Option<String>, Option<u32>)>, group: u32) {
    let succ = |g: u32| if g >= MAX_GROUP_ID { 0 } else { g + 1 };
    for other_group in active.values().filter_map(|(_, g)| *g) {
        if succ(other_group) == group || succ(group) == other_group {
            panic!(
                "active commands with adjacent cyclic groups overlapped: {other_group} and {group}"
            );
        }
    }
}

/// Invariant 4: after drain, unlimited take() calls yield only termination
/// commands.
#[test]
fn invariant_drain_then_take_is_always_termination() {
    let planner: Planner<Job> = Planner::new();
    planner.drain();
    for _ in 0..200 {
        let cmd = planner.take();
        assert_eq!(cmd.tag(), CommandTag::Die);
        planner.complete(&cmd);
    }
}

/// Invariant 5: with nothing submitted and no drain, take() suspends
/// indefinitely (observed here as "no message within a generous timeout").
#[test]
fn invariant_take_suspends_with_no_work() {
    let planner: Planner<Job> = Planner::new();
    let (tx, rx) = mpsc::channel();
    let p = planner.clone();
    // Intentionally not joined: the thread should block forever on the
    // planner's condvar, which is fine for a short-lived test process.
    thread::spawn(move || {
        let cmd = p.take();
        let _ = tx.send(cmd.id);
    });
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

/// Invariant 6: group ids wrap and eligibility keeps working across the
/// wrap boundary, exercised through the real dispatch path rather than the
/// bare `GroupId` arithmetic already covered in `group.rs`'s unit tests.
#[test]
fn invariant_group_wraps_through_real_dispatch() {
    let config = PlannerConfig::new(2).unwrap();
    let planner: Planner<Job> = Planner::with_config(config);

    for rotation in 0..10u64 {
        let job = Job::new(rotation, CommandTag::BroadcastHaStates);
        planner.submit(job.clone());
        let cmd = planner.take();
        assert_eq!(cmd.id, job.id);
        planner.complete(&cmd);
    }
}

/// Invariant 7: drain is idempotent.
#[test]
fn invariant_drain_is_idempotent() {
    let planner: Planner<Job> = Planner::new();
    for _ in 0..5 {
        planner.drain();
    }
    let cmd = planner.take();
    assert_eq!(cmd.tag(), CommandTag::Die);
    planner.complete(&cmd);
}

/// Invariant 8: empty() tracks only the grouped backlog, not the ASAP lane.
#[test]
fn invariant_empty_ignores_asap_lane() {
    let planner: Planner<Job> = Planner::new();
    assert!(planner.empty());

    planner.submit(Job::new(1, CommandTag::HaNvecGet));
    assert!(planner.empty(), "ASAP submissions must not affect empty()");

    planner.submit(Job::new(2, CommandTag::Other));
    assert!(!planner.empty());

    let cmd = planner.take();
    assert_eq!(cmd.tag(), CommandTag::HaNvecGet);
    planner.complete(&cmd);
    assert!(!planner.empty());

    let cmd = planner.take();
    assert_eq!(cmd.tag(), CommandTag::Other);
    planner.complete(&cmd);
    assert!(planner.empty());
}
