//! Command-line demonstration of `fc-planner`.
//!
//! Spins up a pool of worker threads against a single `Planner`, floods it
//! with a mix of grouped and ASAP commands from producer threads, then
//! drains the planner and waits for every worker to exit. Useful for
//! eyeballing group-ordering and ASAP behavior without writing a test.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use rand::Rng;
use tracing::info;

use fc_planner::{Command, CommandTag, ConflictKey, GroupSlot, Planner};

#[derive(Parser, Debug)]
#[command(name = "fc-planner-demo")]
#[command(about = "Exercise fc-planner's group ordering and ASAP fast-path with synthetic load")]
struct Args {
    /// Number of worker threads pulling from the planner.
    #[arg(long, env = "FC_PLANNER_DEMO_WORKERS", default_value = "4")]
    workers: usize,

    /// Number of grouped commands a single producer submits.
    #[arg(long, env = "FC_PLANNER_DEMO_GROUPED", default_value = "40")]
    grouped_commands: usize,

    /// Number of ASAP (process-event) commands a second producer submits.
    #[arg(long, env = "FC_PLANNER_DEMO_ASAP", default_value = "20")]
    asap_commands: usize,

    /// Number of distinct conflict keys (simulated process ids) to spread
    /// ASAP commands across.
    #[arg(long, env = "FC_PLANNER_DEMO_PROCESS_COUNT", default_value = "5")]
    process_count: u32,

    /// How long a worker pretends to execute a command, in milliseconds.
    #[arg(long, env = "FC_PLANNER_DEMO_WORK_MS", default_value = "5")]
    work_ms: u64,
}

/// The demo's own command payload. `fc-planner` never looks past the
/// fields required by `Command`.
struct DemoCommand {
    id: u64,
    tag: CommandTag,
    group: GroupSlot,
    conflict_key: Option<ConflictKey>,
}

impl DemoCommand {
    fn grouped(id: u64, tag: CommandTag) -> Arc<DemoCommand> {
        Arc::new(DemoCommand {
            id,
            tag,
            group: GroupSlot::default(),
            conflict_key: None,
        })
    }

    fn process_event(id: u64, process_id: u32) -> Arc<DemoCommand> {
        Arc::new(DemoCommand {
            id,
            tag: CommandTag::ProcessEvent,
            group: GroupSlot::default(),
            conflict_key: Some(
                ConflictKey::try_from(format!("process-{process_id}").as_str())
                    .expect("synthetic conflict key is always valid"),
            ),
        })
    }
}

impl Command for DemoCommand {
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
        static NEXT: AtomicU64 = AtomicU64::new(u64::MAX / 2);
        DemoCommand {
            id: NEXT.fetch_add(1, Ordering::Relaxed),
            tag: CommandTag::Die,
            group: GroupSlot::default(),
            conflict_key: None,
        }
    }
}

/// Tags a producer picks from when filling the normal backlog, in rough
/// proportion to how often they'd show up in the source system.
const GROUPED_TAG_POOL: &[CommandTag] = &[
    CommandTag::BroadcastHaStates,
    CommandTag::SnsOperation,
    CommandTag::ProcessHaEvent,
    CommandTag::Other,
    CommandTag::Other,
    CommandTag::SnsStatus,
];

fn main() {
    fc_common::init_logging("fc-planner-demo");
    let args = Args::parse();

    let planner: Planner<DemoCommand> = Planner::new();

    let completed = Arc::new(AtomicU64::new(0));
    let workers: Vec<_> = (0..args.workers)
        .map(|worker_id| {
            let planner = planner.clone();
            let completed = Arc::clone(&completed);
            let work_ms = args.work_ms;
            thread::Builder::new()
                .name(format!("fc-planner-demo-worker-{worker_id}"))
                .spawn(move || loop {
                    let cmd = planner.take();
                    if cmd.tag() == CommandTag::Die {
                        info!(worker_id, "received termination command, exiting");
                        planner.complete(&cmd);
                        break;
                    }
                    thread::sleep(Duration::from_millis(work_ms));
                    planner.complete(&cmd);
                    completed.fetch_add(1, Ordering::Relaxed);
                })
                .expect("failed to spawn worker thread")
        })
        .collect();

    let grouped_producer = {
        let planner = planner.clone();
        let count = args.grouped_commands;
        thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for id in 0..count as u64 {
                let tag = GROUPED_TAG_POOL[rng.gen_range(0..GROUPED_TAG_POOL.len())];
                planner.submit(DemoCommand::grouped(id, tag));
            }
        })
    };

    let asap_producer = {
        let planner = planner.clone();
        let count = args.asap_commands;
        let process_count = args.process_count.max(1);
        thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for id in 0..count as u64 {
                let process_id = rng.gen_range(0..process_count);
                planner.submit(DemoCommand::process_event(id + 1_000_000, process_id));
            }
        })
    };

    grouped_producer.join().expect("grouped producer panicked");
    asap_producer.join().expect("ASAP producer panicked");

    while !planner.empty() {
        thread::sleep(Duration::from_millis(10));
    }

    info!("backlog drained, signalling shutdown");
    planner.drain();

    for worker in workers {
        worker.join().expect("worker panicked");
    }

    info!(
        completed = completed.load(Ordering::Relaxed),
        "all workers exited"
    );
}
