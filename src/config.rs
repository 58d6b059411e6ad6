//! Search configuration and its validation.

use std::time::Duration;

use crate::errors::ConfigError;
use crate::line::LINE_LIMIT_CEILING;

/// All knobs for one search run. Defaults: 20 result groups of 15 lines
/// with 10 words each, frequency cutoff 25 with 3 above-cutoff words per
/// line, and a 30-second budget.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Lines per group.
    pub line_limit: usize,
    /// Words per line (hard ceiling 10).
    pub per_line_limit: usize,
    /// Frequency cutoff; 0 disables the balance rule.
    pub freq_cutoff: i32,
    /// Words per line that must be strictly above the cutoff.
    pub freq_above: usize,
    /// Stop after this many completed groups.
    pub max_results: usize,
    /// Wall-clock budget for the whole run.
    pub time_budget: Duration,
    /// Concurrency width: thread-permit count in direct mode, worker count
    /// in pool mode.
    pub worker_count: usize,
    /// Route branches through the bounded worker pool instead of spawning
    /// one thread per branch.
    pub use_pool: bool,
    /// Append the verbose per-line dump to each completed-group rendering.
    pub verbose: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            line_limit: 15,
            per_line_limit: 10,
            freq_cutoff: 25,
            freq_above: 3,
            max_results: 20,
            time_budget: Duration::from_secs(30),
            worker_count: num_cpus::get(),
            use_pool: false,
            verbose: false,
        }
    }
}

impl SearchConfig {
    /// Reject configurations that can never produce a completed group.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_line_limit > LINE_LIMIT_CEILING {
            return Err(ConfigError::LineLimitTooLarge {
                requested: self.per_line_limit,
                max: LINE_LIMIT_CEILING,
            });
        }
        let reason = if self.line_limit == 0 {
            Some("at least one line per group is required")
        } else if self.per_line_limit == 0 {
            Some("at least one word per line is required")
        } else if self.max_results == 0 {
            Some("at least one result must be requested")
        } else if self.worker_count == 0 {
            Some("at least one worker is required")
        } else if self.time_budget.is_zero() {
            Some("the time budget must be positive")
        } else if self.freq_cutoff > 0 && self.freq_above > self.per_line_limit {
            Some("more above-cutoff words requested than fit in a line")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ConfigError::InvalidConfig { reason: reason.to_string() }),
            None => Ok(()),
        }
    }
}
