//! An ordered sequence of lines with overall capacity limits.
//!
//! At most one line is ever "open" (the last one); all earlier lines are
//! full. [`CvcGroup::add_item`] is the single entry point — it opens a new
//! line when needed, rejects canonical-text duplicates across *all* lines,
//! and otherwise delegates to the open line. [`CvcGroup::check_available`]
//! is the feasibility pruning used by the search to abandon branches that
//! provably cannot complete.

use std::fmt;
use std::sync::Arc;

use crate::errors::ConfigError;
use crate::line::CvcLine;
use crate::pool::CvcPool;
use crate::word::CvcWord;

/// A group of up to `line_limit` lines, each holding `per_line_limit` words.
#[derive(Debug, Clone)]
pub struct CvcGroup {
    lines: Vec<CvcLine>,
    line_limit: usize,
    per_line_limit: usize,
    freq_cutoff: i32,
    freq_above: usize,
}

impl CvcGroup {
    /// Create an empty group. Line configuration (`per_line_limit`,
    /// `freq_cutoff`, `freq_above`) is inherited by every line the group
    /// opens.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LineLimitTooLarge`] if `per_line_limit` exceeds
    /// the per-line hard ceiling.
    pub fn new(
        line_limit: usize,
        per_line_limit: usize,
        freq_cutoff: i32,
        freq_above: usize,
    ) -> Result<Self, ConfigError> {
        CvcLine::validate_limit(per_line_limit)?;
        Ok(Self {
            lines: Vec::with_capacity(line_limit),
            line_limit,
            per_line_limit,
            freq_cutoff,
            freq_above,
        })
    }

    pub fn is_full(&self) -> bool {
        self.lines.len() == self.line_limit && self.lines.last().is_some_and(CvcLine::is_full)
    }

    /// Words accepted so far: full lines count `per_line_limit` each, plus
    /// the open line's own count.
    pub fn current_size(&self) -> usize {
        if self.is_full() {
            return self.max_size();
        }
        match self.lines.last() {
            None => 0,
            Some(open) => (self.lines.len() - 1) * self.per_line_limit + open.count(),
        }
    }

    pub fn max_size(&self) -> usize {
        self.line_limit * self.per_line_limit
    }

    pub fn lines(&self) -> &[CvcLine] {
        &self.lines
    }

    /// Try to accept a word. Returns `(added, full)`.
    ///
    /// A group that is already at capacity returns `(false, true)` without
    /// looking at the word. Otherwise a new line is opened if none is open
    /// (consuming one unit of `line_limit`), the word is rejected if its
    /// canonical text already appears in any line, and the open line's own
    /// rules decide the rest. `full` is true exactly when the group holds
    /// `line_limit` lines and the last one is full — including on the very
    /// add that completed it.
    pub fn add_item(&mut self, word: &Arc<CvcWord>) -> (bool, bool) {
        if self.is_full() {
            return (false, true);
        }

        if self.lines.last().is_none_or(CvcLine::is_full) {
            self.lines.push(CvcLine::new_unchecked(
                self.per_line_limit,
                self.freq_cutoff,
                self.freq_above,
            ));
        }

        // Cross-line duplicate rejection by canonical text; the line's own
        // checks are by consonant/vowel slot and would miss this.
        if self.lines.iter().any(|l| l.contains_text(word.canonical())) {
            return (false, false);
        }

        let line_count = self.lines.len();
        let Some(open) = self.lines.last_mut() else {
            return (false, false); // a line was just pushed; not reachable
        };
        let (added, line_full) = open.add_item(word);
        let full = added && line_full && line_count == self.line_limit;
        (added, full)
    }

    /// Feasibility check against a pool: can this group still be completed
    /// from what remains?
    ///
    /// Returns false when the pool is smaller than the group's remaining
    /// capacity, or — with a non-zero cutoff — when the pool's above/below
    /// populations cannot cover the remaining above/below demand
    /// (`line_limit * freq_above` above-cutoff slots in total, the rest
    /// below). A false return means the branch holding this state can never
    /// emit a completed group and must be abandoned.
    pub fn check_available(&self, pool: &CvcPool) -> bool {
        let remaining = self.max_size() - self.current_size();
        if remaining > pool.len() {
            return false;
        }
        if self.freq_cutoff == 0 {
            return true;
        }

        let satisfied_above: usize = self
            .lines
            .iter()
            .map(|l| l.above_cutoff_count(self.freq_cutoff))
            .sum();
        let total_above = self.line_limit * self.freq_above;
        let need_above = total_above.saturating_sub(satisfied_above);
        let need_below = remaining.saturating_sub(need_above);

        let (pool_above, pool_below) = pool.split_by_cutoff(self.freq_cutoff);
        pool_above >= need_above && pool_below >= need_below
    }

    /// Rendering with frequencies and 1-based line numbers:
    /// `\n\t1:[AAB:9, CED:19]\n\t2:[...]\n`.
    pub fn render_with_freq(&self) -> String {
        let mut out = String::from("\n");
        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(&format!("\t{}:{}\n", i + 1, line.render_with_freq()));
        }
        out
    }

    /// Verbose per-line internal state.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(&format!("line {}:\n{}\n", i + 1, line.dump()));
        }
        out.push_str(&format!(
            "lines: {}/{}\nsize: {}/{}\nfreq_cutoff: {}\nfreq_above: {}\n",
            self.lines.len(),
            self.line_limit,
            self.current_size(),
            self.max_size(),
            self.freq_cutoff,
            self.freq_above,
        ));
        out
    }
}

impl fmt::Display for CvcGroup {
    /// One bracketed line per row: `\n\t[AAB, CED]\n\t[FIG, JOK]\n`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\n")?;
        for line in &self.lines {
            writeln!(f, "\t{line}")?;
        }
        Ok(())
    }
}
