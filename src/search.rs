//! The search orchestrator: seeding, result collection, stop conditions,
//! and the drain.
//!
//! [`run_search`] is the single entry point. It seeds one branch over the
//! base group and the full pool, consumes the branch message stream on a
//! collector thread, and stops on whichever comes first: the requested
//! number of completed groups, the wall-clock budget, or natural exhaustion
//! of the branch population. It returns only after every spawned branch has
//! drained.
//!
//! # Examples
//!
//! ```
//! use cvcwords::config::SearchConfig;
//! use cvcwords::inventory::{build_pool, parse_records, LetterSet};
//! use cvcwords::search::run_search;
//!
//! let vowels = LetterSet::parse_from_str("A: 0\nE: 0\nI: 0\nO: 0\nU: 0");
//! let records = parse_records("AAB: 9\nCED: 19\nFIG: 29\nJOK: 39");
//! let pool = build_pool(&records, &vowels)?;
//!
//! let config = SearchConfig {
//!     line_limit: 2,
//!     per_line_limit: 2,
//!     freq_cutoff: 0,
//!     max_results: 1,
//!     ..SearchConfig::default()
//! };
//! let result = run_search(pool, &config)?;
//! println!("found {} groups", result.groups.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};

use crate::branch::{
    BranchMessage, Executor, SearchCtx, SearchState, ThreadPermits, OBSERVE_INTERVAL,
    QUIESCENT_OBSERVATIONS,
};
use crate::config::SearchConfig;
use crate::errors::ConfigError;
use crate::group::CvcGroup;
use crate::pool::CvcPool;
use crate::workers::WorkerPool;

/// Backlog capacity in pool mode. Overflow degrades to inline execution on
/// the submitting thread, so this bounds memory, not correctness.
const BACKLOG_CAPACITY: usize = 1024;

/// Status of a finished search run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    /// The requested number of completed groups was collected.
    FoundEnough,

    /// The wall-clock budget expired first. Contains the elapsed time.
    TimedOut { elapsed: Duration },

    /// The branch population drained naturally before the quota was met:
    /// every reachable state was explored or pruned.
    PoolExhausted,
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// Completed groups collected (equals `groups.len()` on the result).
    pub completed: usize,
    /// Branches registered over the whole run.
    pub branches: usize,
    /// Peak number of simultaneously live branches.
    pub peak_live: usize,
    /// Deepest group fill level any branch reported.
    pub max_depth: usize,
    /// Branch faults contained at the branch boundary.
    pub faults: usize,
    /// Wall-clock duration of the run, including the drain.
    pub elapsed: Duration,
}

/// Successful search run (even if it stopped early).
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Rendered completed groups, in discovery order (which is
    /// non-deterministic across runs).
    pub groups: Vec<String>,
    /// Why the run stopped.
    pub status: SearchStatus,
    /// Aggregate counters.
    pub stats: SearchStats,
}

/// Unified error type for the search pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Invalid configuration or inventory, detected before any branch runs.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The orchestration thread could not be started.
    #[error("failed to start orchestration thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl SearchError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::Config(_) => "S001",
            SearchError::Spawn(_) => "S002",
        }
    }

    /// Formats the error with code and any nested detail
    #[must_use]
    pub fn display_detailed(&self) -> String {
        match self {
            SearchError::Config(ce) => {
                format!("{}\n  caused by: {}", self.code(), ce.display_detailed())
            }
            SearchError::Spawn(_) => format!("{self} ({})", self.code()),
        }
    }
}

/// Run the search over `pool` under `config`.
///
/// Blocks until the run has fully drained: after a stop is requested, the
/// live-branch gauge must settle at zero for several consecutive
/// observation intervals before the function returns (a single zero reading
/// can be a race between a branch exit and its successor's registration).
///
/// # Errors
///
/// Returns a [`SearchError`] if the configuration is invalid or the
/// collector thread cannot be started. The search itself never errors:
/// constraint violations prune branches, and branch faults are contained
/// and counted in [`SearchStats::faults`].
pub fn run_search(pool: CvcPool, config: &SearchConfig) -> Result<SearchResult, SearchError> {
    config.validate()?;
    let base = CvcGroup::new(
        config.line_limit,
        config.per_line_limit,
        config.freq_cutoff,
        config.freq_above,
    )?;

    let (message_tx, message_rx) = unbounded();
    let (done_tx, done_rx) = bounded(1);

    let executor = if config.use_pool {
        Executor::Pool(WorkerPool::new(config.worker_count, BACKLOG_CAPACITY))
    } else {
        Executor::Direct {
            permits: Arc::new(ThreadPermits::new(config.worker_count)),
        }
    };
    let ctx = Arc::new(SearchCtx::new(
        config.max_results,
        config.verbose,
        message_tx,
        executor,
    ));

    let collector = {
        let ctx = Arc::clone(&ctx);
        thread::Builder::new()
            .name("cvc-collector".to_string())
            .spawn(move || collect(&ctx, &message_rx, &done_tx))?
    };

    let started = Instant::now();
    log::debug!(
        "seeding search: {} lines of {} words, pool of {}",
        config.line_limit,
        config.per_line_limit,
        pool.len()
    );
    ctx.submit(SearchState { group: base, pool });

    let status = wait_for_stop(&ctx, &done_rx, started, config.time_budget);

    // Whichever condition fired, stop the world and wait for the branch
    // population to settle before touching the results.
    ctx.request_stop();
    ctx.wait_quiescent();
    ctx.send(BranchMessage::Drained);

    let groups = match collector.join() {
        Ok(groups) => groups,
        Err(_) => {
            log::warn!("collector thread panicked; collected results were lost");
            Vec::new()
        }
    };
    ctx.shutdown_executor();

    let stats = SearchStats {
        completed: groups.len(),
        branches: ctx.branches_spawned(),
        peak_live: ctx.peak_live(),
        max_depth: ctx.max_depth_seen(),
        faults: ctx.fault_count(),
        elapsed: started.elapsed(),
    };
    log::info!(
        "search finished: {} groups, {} branches (peak {} live), max depth {}, {:.2}s",
        stats.completed,
        stats.branches,
        stats.peak_live,
        stats.max_depth,
        stats.elapsed.as_secs_f64()
    );

    Ok(SearchResult { groups, status, stats })
}

/// Wait for the first stop condition: quota met (collector signal), budget
/// expired, or the branch population idle for several consecutive ticks.
fn wait_for_stop(
    ctx: &SearchCtx,
    done: &Receiver<()>,
    started: Instant,
    budget: Duration,
) -> SearchStatus {
    let deadline = started + budget;
    let mut consecutive_idle = 0u32;

    loop {
        let now = Instant::now();
        if now >= deadline {
            return SearchStatus::TimedOut { elapsed: started.elapsed() };
        }
        let tick = OBSERVE_INTERVAL.min(deadline - now);

        match done.recv_timeout(tick) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return SearchStatus::FoundEnough,
            Err(RecvTimeoutError::Timeout) => {
                // Debounced idle detection: transient zeros occur between a
                // branch exit and its successor's registration.
                if ctx.live_branches() == 0 {
                    consecutive_idle += 1;
                    if consecutive_idle >= QUIESCENT_OBSERVATIONS {
                        return SearchStatus::PoolExhausted;
                    }
                } else {
                    consecutive_idle = 0;
                }
            }
        }
    }
}

/// Consume the branch message stream. Returns the collected renderings.
///
/// Closes the stream (by returning) as soon as the quota is met — the stop
/// flag is raised here too, so branches wind down without waiting for the
/// orchestrator's tick.
fn collect(ctx: &SearchCtx, messages: &Receiver<BranchMessage>, done: &Sender<()>) -> Vec<String> {
    let mut groups = Vec::new();
    while let Ok(message) = messages.recv() {
        match message {
            BranchMessage::Progress { depth, max } => {
                log::info!("status: reached depth {depth} of {max}");
            }
            BranchMessage::Depth(depth) => {
                log::info!("max depth: {depth}");
            }
            BranchMessage::Completed(rendering) => {
                let total = ctx.note_completed();
                log::info!("group {total} completed{rendering}");
                groups.push(rendering);
                if total >= ctx.max_results() {
                    ctx.request_stop();
                    let _ = done.send(());
                    break;
                }
            }
            BranchMessage::Drained => break,
        }
    }
    groups
}
