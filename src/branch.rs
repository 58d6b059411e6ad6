//! The branch procedure and the orchestration state shared by all branches.
//!
//! A *branch* is one independent unit of concurrent work exploring a
//! `(group, pool)` pair it exclusively owns. Branches never share mutable
//! domain state: a fork hands the child its own copies, and the only
//! synchronized objects are the counters and the message channel collected
//! in [`SearchCtx`].
//!
//! Fault policy: a panic inside one branch is caught at the branch boundary,
//! counted, and logged; sibling branches are unaffected. Cancellation is
//! cooperative — the stop flag and the result quota are re-checked before
//! every enumeration step and before every fork.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use parking_lot::{Condvar, Mutex};

use crate::group::CvcGroup;
use crate::pool::CvcPool;
use crate::word::CvcWord;
use crate::workers::{Job, WorkerPool};

/// Interval between idle observations while waiting for quiescence.
pub(crate) const OBSERVE_INTERVAL: Duration = Duration::from_millis(50);

/// Consecutive zero observations required before the search counts as
/// drained. A single zero reading can be transient: it may fall between one
/// branch's exit and its successor's registration.
pub(crate) const QUIESCENT_OBSERVATIONS: u32 = 3;

/// One unit of search state, exclusively owned by the branch exploring it.
#[derive(Debug, Clone)]
pub(crate) struct SearchState {
    pub(crate) group: CvcGroup,
    pub(crate) pool: CvcPool,
}

/// Messages from branches to the orchestrator's collector.
#[derive(Debug)]
pub(crate) enum BranchMessage {
    /// A branch crossed 90% of the group's capacity.
    Progress { depth: usize, max: usize },
    /// A branch reached a new global maximum depth.
    Depth(usize),
    /// A completed group, already rendered.
    Completed(String),
    /// Orchestrator sentinel after the drain: stop collecting.
    Drained,
}

/// Counting permits for direct-mode thread spawns. `try_acquire` never
/// blocks; a submitter that gets no permit runs the branch inline instead.
pub(crate) struct ThreadPermits {
    available: AtomicUsize,
}

impl ThreadPermits {
    pub(crate) fn new(count: usize) -> Self {
        Self { available: AtomicUsize::new(count) }
    }

    pub(crate) fn try_acquire(&self) -> bool {
        let mut current = self.available.load(Ordering::Acquire);
        while current > 0 {
            match self.available.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
        false
    }

    pub(crate) fn release(&self) {
        self.available.fetch_add(1, Ordering::AcqRel);
    }
}

/// Live-branch gauge: an explicit quiescence primitive instead of busy
/// polling. Registration happens at submit time (before the branch starts),
/// so the count never dips to zero while work is still queued.
pub(crate) struct BranchGauge {
    active: Mutex<usize>,
    idle: Condvar,
    peak: AtomicUsize,
}

impl BranchGauge {
    pub(crate) fn new() -> Self {
        Self {
            active: Mutex::new(0),
            idle: Condvar::new(),
            peak: AtomicUsize::new(0),
        }
    }

    pub(crate) fn register(&self) {
        let mut active = self.active.lock();
        *active += 1;
        self.peak.fetch_max(*active, Ordering::Relaxed);
    }

    pub(crate) fn unregister(&self) {
        let mut active = self.active.lock();
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.idle.notify_all();
        }
    }

    pub(crate) fn active(&self) -> usize {
        *self.active.lock()
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Block until the count has stayed at zero for `required` consecutive
    /// observation intervals.
    pub(crate) fn wait_quiescent(&self, interval: Duration, required: u32) {
        let mut active = self.active.lock();
        loop {
            while *active != 0 {
                self.idle.wait(&mut active);
            }

            let mut observations = 1;
            while observations < required && *active == 0 {
                let timed_out = self.idle.wait_for(&mut active, interval).timed_out();
                if timed_out {
                    if *active == 0 {
                        observations += 1;
                    }
                } else {
                    // Woken mid-interval: the count transitioned, so the
                    // consecutive streak starts over.
                    observations = 1;
                }
            }
            if *active == 0 && observations >= required {
                return;
            }
            // a new branch registered mid-debounce; start over
        }
    }
}

/// How accepted branches are scheduled.
pub(crate) enum Executor {
    /// One thread per branch, capped by permits; no permit means the branch
    /// runs inline on the submitting thread.
    Direct { permits: Arc<ThreadPermits> },
    /// Branches become jobs on a fixed-size worker pool with a bounded
    /// backlog queue.
    Pool(WorkerPool),
}

/// Orchestration state shared by every branch of one search run.
pub(crate) struct SearchCtx {
    max_results: usize,
    verbose: bool,
    stop: AtomicBool,
    completed: AtomicUsize,
    max_depth: AtomicUsize,
    faults: AtomicUsize,
    spawned: AtomicUsize,
    gauge: BranchGauge,
    messages: Sender<BranchMessage>,
    executor: Executor,
}

impl SearchCtx {
    pub(crate) fn new(
        max_results: usize,
        verbose: bool,
        messages: Sender<BranchMessage>,
        executor: Executor,
    ) -> Self {
        Self {
            max_results,
            verbose,
            stop: AtomicBool::new(false),
            completed: AtomicUsize::new(0),
            max_depth: AtomicUsize::new(0),
            faults: AtomicUsize::new(0),
            spawned: AtomicUsize::new(0),
            gauge: BranchGauge::new(),
            messages,
            executor,
        }
    }

    pub(crate) fn max_results(&self) -> usize {
        self.max_results
    }

    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// True once the collector has counted `max_results` completed groups.
    pub(crate) fn quota_reached(&self) -> bool {
        self.completed.load(Ordering::Acquire) >= self.max_results
    }

    /// Called by the collector for each completed group; returns the new
    /// total.
    pub(crate) fn note_completed(&self) -> usize {
        self.completed.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn note_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
        log::warn!("branch fault contained; sibling branches continue");
    }

    pub(crate) fn send(&self, message: BranchMessage) {
        // A closed stream means the collector is done; late messages are
        // dropped on purpose.
        let _ = self.messages.send(message);
    }

    pub(crate) fn live_branches(&self) -> usize {
        self.gauge.active()
    }

    pub(crate) fn peak_live(&self) -> usize {
        self.gauge.peak()
    }

    pub(crate) fn branches_spawned(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }

    pub(crate) fn fault_count(&self) -> usize {
        self.faults.load(Ordering::Relaxed)
    }

    pub(crate) fn max_depth_seen(&self) -> usize {
        self.max_depth.load(Ordering::Relaxed)
    }

    pub(crate) fn wait_quiescent(&self) {
        self.gauge
            .wait_quiescent(OBSERVE_INTERVAL, QUIESCENT_OBSERVATIONS);
    }

    pub(crate) fn shutdown_executor(&self) {
        if let Executor::Pool(pool) = &self.executor {
            pool.shutdown();
        }
    }

    /// Register and schedule one branch. Never called after the drain has
    /// begun: submits are dropped once stop is requested or the quota is met.
    pub(crate) fn submit(self: &Arc<Self>, state: SearchState) {
        if self.stop_requested() || self.quota_reached() {
            return;
        }
        self.gauge.register();
        self.spawned.fetch_add(1, Ordering::Relaxed);

        match &self.executor {
            Executor::Direct { permits } => {
                if permits.try_acquire() {
                    let ctx = Arc::clone(self);
                    let permits = Arc::clone(permits);
                    let permits_closure = Arc::clone(&permits);
                    let spawned = thread::Builder::new()
                        .name("cvc-branch".to_string())
                        .spawn(move || {
                            run_branch(&ctx, state);
                            permits_closure.release();
                        });
                    if spawned.is_err() {
                        // The closure (and the state) is gone; treat the
                        // branch as pruned so the drain still settles.
                        permits.release();
                        self.gauge.unregister();
                        self.note_fault();
                    }
                } else {
                    run_branch(self, state);
                }
            }
            Executor::Pool(pool) => {
                let job = Job::new(state, Arc::clone(self));
                if let Err(job) = pool.try_submit(job) {
                    // Backlog full (or closed): run on the submitting thread.
                    job.run();
                }
            }
        }
    }
}

/// Execute one branch with its exit accounting and fault containment.
pub(crate) fn run_branch(ctx: &Arc<SearchCtx>, state: SearchState) {
    struct ExitGuard<'a>(&'a SearchCtx);
    impl Drop for ExitGuard<'_> {
        fn drop(&mut self) {
            self.0.gauge.unregister();
        }
    }

    let _guard = ExitGuard(ctx);
    if catch_unwind(AssertUnwindSafe(|| explore(ctx, state))).is_err() {
        ctx.note_fault();
    }
}

/// The branching procedure itself.
///
/// Abandons infeasible states, reports depth milestones, then tries every
/// pool word in turn. Each candidate is probed on a *copy* of the group, so
/// this branch's own group never changes: an accepted copy becomes the
/// forked child's state (with the word removed from this branch's pool), a
/// completing copy is rendered and emitted, and a rejected copy is dropped.
fn explore(ctx: &Arc<SearchCtx>, state: SearchState) {
    let SearchState { group, mut pool } = state;

    if !group.check_available(&pool) {
        return;
    }

    let size = group.current_size();
    let max = group.max_size();
    if size * 10 > max * 9 {
        ctx.send(BranchMessage::Progress { depth: size, max });
    }
    if size > ctx.max_depth.fetch_max(size, Ordering::Relaxed) {
        ctx.send(BranchMessage::Depth(size));
    }

    // Snapshot: acceptance removes words from the live pool mid-loop.
    let candidates: Vec<Arc<CvcWord>> = pool.words().to_vec();
    for word in candidates {
        if ctx.stop_requested() || ctx.quota_reached() {
            break;
        }

        let mut candidate = group.clone();
        let (added, full) = candidate.add_item(&word);
        if full {
            // A full group cannot take further words; render and stop.
            let completed = if added { &candidate } else { &group };
            let mut rendering = completed.render_with_freq();
            if ctx.verbose {
                rendering.push_str(&completed.dump());
            }
            ctx.send(BranchMessage::Completed(rendering));
            break;
        }
        if added {
            pool.remove(&word);
            ctx.submit(SearchState { group: candidate, pool: pool.clone() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_permits_exhaust_and_release() {
        let permits = ThreadPermits::new(2);
        assert!(permits.try_acquire());
        assert!(permits.try_acquire());
        assert!(!permits.try_acquire());

        permits.release();
        assert!(permits.try_acquire());
    }

    #[test]
    fn test_gauge_counts_and_peak() {
        let gauge = BranchGauge::new();
        gauge.register();
        gauge.register();
        gauge.unregister();
        gauge.register();

        assert_eq!(gauge.active(), 2);
        assert_eq!(gauge.peak(), 2);
    }

    #[test]
    fn test_wait_quiescent_returns_after_debounce() {
        let gauge = Arc::new(BranchGauge::new());
        gauge.register();

        let worker = {
            let gauge = Arc::clone(&gauge);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                gauge.unregister();
            })
        };

        let started = Instant::now();
        gauge.wait_quiescent(Duration::from_millis(10), 3);
        let waited = started.elapsed();

        // Had to wait for the unregister plus the debounce intervals.
        assert!(waited >= Duration::from_millis(30));
        assert_eq!(gauge.active(), 0);
        worker.join().unwrap();
    }

    #[test]
    fn test_wait_quiescent_restarts_when_branch_registers_mid_debounce() {
        let gauge = Arc::new(BranchGauge::new());
        gauge.register();

        let worker = {
            let gauge = Arc::clone(&gauge);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                gauge.unregister();
                // Successor registers inside the debounce window, then exits.
                thread::sleep(Duration::from_millis(5));
                gauge.register();
                thread::sleep(Duration::from_millis(40));
                gauge.unregister();
            })
        };

        gauge.wait_quiescent(Duration::from_millis(10), 3);
        worker.join().unwrap();
        assert_eq!(gauge.active(), 0);
    }
}
