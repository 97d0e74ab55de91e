//! Deferred-task scheduling behind an injectable trait.
//!
//! Production code runs on [TokioScheduler]; tests drive the same call
//! sites through [VirtualScheduler], which advances a virtual clock
//! deterministically instead of sleeping.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::AbortHandle;

/// A deferred unit of work; boxed so schedulers can store heterogeneous tasks.
pub type ScheduledTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Shared scheduling facility: run `task` once `delay` has elapsed.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> CancelHandle;
}

/// Handle to a scheduled task. Cancelling prevents a not-yet-started task
/// from running; a task already executing completes regardless.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl CancelHandle {
    fn new(cancelled: Arc<AtomicBool>, abort: Option<AbortHandle>) -> Self {
        Self { cancelled, abort }
    }

    /// Idempotent; safe to call after the task has fired.
    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::SeqCst)
    }
}

/// Real-time scheduler backed by the tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> CancelHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Abort normally wins the race; the flag covers the window
            // between wake-up and the first poll of the task body.
            if flag.load(AtomicOrdering::SeqCst) {
                return;
            }
            task.await;
        });
        CancelHandle::new(cancelled, Some(join.abort_handle()))
    }
}

struct VirtualEntry {
    due: Duration,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    task: ScheduledTask,
}

impl PartialEq for VirtualEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for VirtualEntry {}

impl Ord for VirtualEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by due time;
        // ties break in schedule order.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for VirtualEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct VirtualQueue {
    now: Duration,
    next_seq: u64,
    entries: BinaryHeap<VirtualEntry>,
}

/// Deterministic scheduler over virtual time. Nothing runs until the
/// clock is advanced; due tasks then run sequentially in due order.
#[derive(Default)]
pub struct VirtualScheduler {
    queue: Mutex<VirtualQueue>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VirtualQueue> {
        self.queue.lock().expect("virtual scheduler lock poisoned")
    }

    /// Current virtual time, measured from scheduler creation.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of scheduled tasks that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|entry| !entry.cancelled.load(AtomicOrdering::SeqCst))
            .count()
    }

    /// Advance the clock to absolute virtual time `target`, running every
    /// non-cancelled task due on the way, one at a time and to completion.
    pub async fn advance_to(&self, target: Duration) {
        loop {
            let entry = {
                let mut queue = self.lock();
                match queue.entries.peek() {
                    Some(next) if next.due <= target => {
                        let entry = queue.entries.pop().expect("peeked entry");
                        queue.now = queue.now.max(entry.due);
                        entry
                    }
                    _ => {
                        queue.now = queue.now.max(target);
                        return;
                    }
                }
            };
            if !entry.cancelled.load(AtomicOrdering::SeqCst) {
                entry.task.await;
            }
        }
    }

    /// Advance the clock by `delta` from the current virtual time.
    pub async fn advance(&self, delta: Duration) {
        let target = self.now() + delta;
        self.advance_to(target).await;
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> CancelHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut queue = self.lock();
        let due = queue.now + delay;
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.entries.push(VirtualEntry {
            due,
            seq,
            cancelled: Arc::clone(&cancelled),
            task,
        });
        CancelHandle::new(cancelled, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> ScheduledTask) {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let writer = {
            let log = Arc::clone(&log);
            move |label: &'static str| -> ScheduledTask {
                let log = Arc::clone(&log);
                Box::pin(async move {
                    log.lock().expect("log lock").push(label);
                })
            }
        };
        (log, writer)
    }

    #[tokio::test]
    async fn virtual_tasks_run_in_due_order() {
        let scheduler = VirtualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule(Duration::from_secs(10), task("second"));
        scheduler.schedule(Duration::from_secs(5), task("first"));
        scheduler.schedule(Duration::from_secs(20), task("third"));

        scheduler.advance_to(Duration::from_secs(30)).await;

        assert_eq!(*log.lock().expect("log lock"), vec!["first", "second", "third"]);
        assert_eq!(scheduler.now(), Duration::from_secs(30));
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn advancing_partway_runs_only_due_tasks() {
        let scheduler = VirtualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule(Duration::from_secs(5), task("early"));
        scheduler.schedule(Duration::from_secs(15), task("late"));

        scheduler.advance_to(Duration::from_secs(10)).await;
        assert_eq!(*log.lock().expect("log lock"), vec!["early"]);
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(Duration::from_secs(5)).await;
        assert_eq!(*log.lock().expect("log lock"), vec!["early", "late"]);
    }

    #[tokio::test]
    async fn cancelled_tasks_never_run() {
        let scheduler = VirtualScheduler::new();
        let (log, task) = recorder();

        let handle = scheduler.schedule(Duration::from_secs(5), task("cancelled"));
        scheduler.schedule(Duration::from_secs(5), task("kept"));
        handle.cancel();
        assert!(handle.is_cancelled());

        scheduler.advance_to(Duration::from_secs(5)).await;
        assert_eq!(*log.lock().expect("log lock"), vec!["kept"]);
    }

    #[tokio::test]
    async fn same_instant_tasks_run_in_schedule_order() {
        let scheduler = VirtualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule(Duration::from_secs(5), task("a"));
        scheduler.schedule(Duration::from_secs(5), task("b"));
        scheduler.schedule(Duration::from_secs(5), task("c"));

        scheduler.advance_to(Duration::from_secs(5)).await;
        assert_eq!(*log.lock().expect("log lock"), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn delays_compound_from_current_virtual_time() {
        let scheduler = VirtualScheduler::new();
        let (log, task) = recorder();

        scheduler.advance_to(Duration::from_secs(7)).await;
        scheduler.schedule(Duration::from_secs(3), task("offset"));

        scheduler.advance_to(Duration::from_secs(9)).await;
        assert!(log.lock().expect("log lock").is_empty());

        scheduler.advance_to(Duration::from_secs(10)).await;
        assert_eq!(*log.lock().expect("log lock"), vec!["offset"]);
    }
}
