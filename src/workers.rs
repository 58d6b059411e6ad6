//! Fixed-size worker pool for branch execution.
//!
//! The alternative to one-thread-per-branch under combinatorial blow-up:
//! accepted branches become [`Job`]s on a bounded backlog queue drained by a
//! fixed set of workers. A full backlog pushes execution back onto the
//! submitting thread (see `SearchCtx::submit`), which is the backpressure
//! mechanism — submitters never block on the queue, so workers feeding the
//! queue cannot deadlock it.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;

use crate::branch::{run_branch, SearchCtx, SearchState};

/// How often idle workers wake to check for shutdown.
const RECV_TICK: Duration = Duration::from_millis(50);

const PHASE_QUEUED: u8 = 0;
const PHASE_RUNNING: u8 = 1;
const PHASE_FINISHED: u8 = 2;

/// One branch submitted to the pool. A job moves queued → running →
/// finished; the worker disposes of it as soon as it finishes.
pub(crate) struct Job {
    state: SearchState,
    ctx: Arc<SearchCtx>,
    phase: AtomicU8,
}

impl Job {
    pub(crate) fn new(state: SearchState, ctx: Arc<SearchCtx>) -> Self {
        Self {
            state,
            ctx,
            phase: AtomicU8::new(PHASE_QUEUED),
        }
    }

    /// Execute the branch on the calling thread, advancing the lifecycle.
    pub(crate) fn run(self) {
        self.phase.store(PHASE_RUNNING, Ordering::Release);
        let Job { state, ctx, phase } = self;
        run_branch(&ctx, state);
        phase.store(PHASE_FINISHED, Ordering::Release);
        // Dropped here: a finished job holds nothing worth keeping.
    }
}

struct PoolShared {
    shutdown: AtomicBool,
    finished: AtomicUsize,
}

/// The pool: a bounded backlog plus the worker threads draining it.
pub(crate) struct WorkerPool {
    backlog: Sender<Job>,
    shared: Arc<PoolShared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub(crate) fn new(worker_count: usize, queue_capacity: usize) -> Self {
        let (backlog, jobs) = bounded::<Job>(queue_capacity);
        let shared = Arc::new(PoolShared {
            shutdown: AtomicBool::new(false),
            finished: AtomicUsize::new(0),
        });

        let mut handles = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let jobs = jobs.clone();
            let shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("cvc-worker-{i}"))
                .spawn(move || worker_loop(&jobs, &shared));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => log::warn!("failed to start worker {i}: {e}"),
            }
        }

        Self {
            backlog,
            shared,
            handles: Mutex::new(handles),
        }
    }

    /// Queue a job, or hand it back when the backlog is full so the
    /// submitter can run it inline.
    pub(crate) fn try_submit(&self, job: Job) -> Result<(), Job> {
        match self.backlog.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job) | TrySendError::Disconnected(job)) => Err(job),
        }
    }

    /// Stop and join the workers. Only called after the search has
    /// quiesced, so the backlog is already empty.
    pub(crate) fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        for handle in self.handles.lock().drain(..) {
            let _ = handle.join();
        }
        log::debug!(
            "worker pool drained after {} jobs",
            self.shared.finished.load(Ordering::Relaxed)
        );
    }
}

fn worker_loop(jobs: &Receiver<Job>, shared: &PoolShared) {
    loop {
        match jobs.recv_timeout(RECV_TICK) {
            Ok(job) => {
                job.run();
                shared.finished.fetch_add(1, Ordering::Relaxed);
            }
            Err(RecvTimeoutError::Timeout) => {
                if shared.shutdown.load(Ordering::Acquire) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
