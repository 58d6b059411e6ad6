//! One constrained sub-list of words within a group.
//!
//! A line accepts at most `limit` words and enforces three local rules:
//!
//! - no consonant value (from either slot of any accepted word) may repeat
//!   across the line;
//! - no vowel value may be used by more than two accepted words;
//! - with a non-zero frequency cutoff, a *full* line must contain exactly
//!   `freq_above` words whose frequency is strictly above the cutoff — the
//!   check is enforced incrementally so no add can strand the line.
//!
//! Rejections are reported through the `(added, full)` return of
//! [`CvcLine::add_item`], never as errors; the only fatal condition is
//! requesting a limit above the hard ceiling at construction time.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::errors::ConfigError;
use crate::word::CvcWord;

/// Hard ceiling on words per line; construction above this fails.
pub const LINE_LIMIT_CEILING: usize = 10;

/// Maximum number of accepted words sharing one vowel value.
const VOWEL_USAGE_LIMIT: u8 = 2;

/// A line of words with per-line uniqueness and frequency-balance rules.
#[derive(Debug, Clone)]
pub struct CvcLine {
    items: Vec<Arc<CvcWord>>,
    consonants_used: HashSet<String>,
    vowel_usage: HashMap<String, u8>,
    limit: usize,
    freq_cutoff: i32,
    freq_above: usize,
}

impl CvcLine {
    /// Create a line holding up to `limit` words.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LineLimitTooLarge`] if `limit` exceeds
    /// [`LINE_LIMIT_CEILING`]; the limit is never silently clamped.
    pub fn new(limit: usize, freq_cutoff: i32, freq_above: usize) -> Result<Self, ConfigError> {
        Self::validate_limit(limit)?;
        Ok(Self::new_unchecked(limit, freq_cutoff, freq_above))
    }

    pub(crate) fn validate_limit(limit: usize) -> Result<(), ConfigError> {
        if limit > LINE_LIMIT_CEILING {
            return Err(ConfigError::LineLimitTooLarge {
                requested: limit,
                max: LINE_LIMIT_CEILING,
            });
        }
        Ok(())
    }

    /// Construction path for callers that validated the limit already
    /// (the group validates once and opens many lines).
    pub(crate) fn new_unchecked(limit: usize, freq_cutoff: i32, freq_above: usize) -> Self {
        Self {
            items: Vec::with_capacity(limit),
            consonants_used: HashSet::new(),
            vowel_usage: HashMap::new(),
            limit,
            freq_cutoff,
            freq_above,
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.limit
    }

    pub fn items(&self) -> &[Arc<CvcWord>] {
        &self.items
    }

    /// True if any accepted word has this canonical text (value comparison,
    /// used by the group's cross-line duplicate rejection).
    pub fn contains_text(&self, canonical: &str) -> bool {
        self.items.iter().any(|w| w.canonical() == canonical)
    }

    /// Number of accepted words with frequency strictly above `cutoff`.
    pub fn above_cutoff_count(&self, cutoff: i32) -> usize {
        self.items.iter().filter(|w| w.freq() > cutoff).count()
    }

    /// Try to accept a word. Returns `(added, full)`:
    /// `added` is false when any local rule rejects the word;
    /// `full` is true iff the line holds `limit` words after the call.
    pub fn add_item(&mut self, word: &Arc<CvcWord>) -> (bool, bool) {
        if self.is_full() {
            return (false, true);
        }
        if self.consonants_used.contains(word.c1()) || self.consonants_used.contains(word.c2()) {
            return (false, false);
        }
        if self
            .vowel_usage
            .get(word.vowel())
            .is_some_and(|&n| n >= VOWEL_USAGE_LIMIT)
        {
            return (false, false);
        }
        if !self.freq_balance_ok(word) {
            return (false, false);
        }

        self.consonants_used.insert(word.c1().to_string());
        self.consonants_used.insert(word.c2().to_string());
        *self.vowel_usage.entry(word.vowel().to_string()).or_insert(0) += 1;
        self.items.push(Arc::clone(word));

        (true, self.is_full())
    }

    /// Incremental frequency-balance check.
    ///
    /// Counting the candidate along with the accepted words, reject if the
    /// above-cutoff count would exceed `freq_above`, or if the line would
    /// become full with fewer than `freq_above` above-cutoff words. A full
    /// line therefore holds *exactly* `freq_above` of them. Disabled when the
    /// cutoff is zero.
    fn freq_balance_ok(&self, word: &CvcWord) -> bool {
        if self.freq_cutoff == 0 {
            return true;
        }

        let mut above = usize::from(word.freq() > self.freq_cutoff);
        let mut below = usize::from(word.freq() <= self.freq_cutoff);
        for item in &self.items {
            if item.freq() > self.freq_cutoff {
                above += 1;
            } else {
                below += 1;
            }
        }

        if above > self.freq_above {
            return false;
        }
        if above + below == self.limit && above < self.freq_above {
            return false;
        }
        true
    }

    /// Rendering with frequencies, e.g. `[AAB:9, CED:19]`.
    pub fn render_with_freq(&self) -> String {
        let inner = self
            .items
            .iter()
            .map(|w| format!("{}:{}", w, w.freq()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{inner}]")
    }

    /// Verbose internal state for debug dumps.
    pub fn dump(&self) -> String {
        let mut consonants: Vec<&str> = self.consonants_used.iter().map(String::as_str).collect();
        consonants.sort_unstable();
        let mut vowels: Vec<String> = self
            .vowel_usage
            .iter()
            .map(|(v, n)| format!("{v}x{n}"))
            .collect();
        vowels.sort_unstable();
        format!(
            "items: {}\nconsonants: {:?}\nvowels: {:?}\ncount: {}\nlimit: {}\nfreq_cutoff: {}\nfreq_above: {}",
            self.render_with_freq(),
            consonants,
            vowels,
            self.count(),
            self.limit,
            self.freq_cutoff,
            self.freq_above,
        )
    }
}

impl fmt::Display for CvcLine {
    /// Bracketed word list, e.g. `[AAB, CED, FIG]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self
            .items
            .iter()
            .map(|w| w.canonical().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "[{inner}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<Arc<CvcWord>> {
        // Distinct consonants, vowels cycling A E I O U, frequencies
        // 9, 19, 29, ...
        [
            ("A", "A", "B", 9),
            ("C", "E", "D", 19),
            ("F", "I", "G", 29),
            ("J", "O", "K", 39),
            ("L", "U", "M", 49),
            ("N", "A", "P", 59),
            ("Q", "E", "R", 69),
            ("S", "I", "T", 79),
            ("V", "O", "W", 89),
            ("X", "U", "Y", 99),
            ("R", "A", "Z", 109),
            ("B", "A", "G", 119),
            ("K", "E", "B", 129),
        ]
        .iter()
        .map(|&(c1, v, c2, f)| Arc::new(CvcWord::new(c1, v, c2, f)))
        .collect()
    }

    #[test]
    fn test_limit_one_second_add_reports_full() {
        let ws = words();
        let mut line = CvcLine::new(1, 0, 0).unwrap();

        let (added, full) = line.add_item(&ws[0]);
        assert!(added);
        assert!(full);

        let (added, full) = line.add_item(&ws[1]);
        assert!(!added);
        assert!(full);
        assert_eq!(line.count(), 1);
    }

    #[test]
    fn test_limit_above_ceiling_is_rejected() {
        let err = CvcLine::new(11, 0, 0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LineLimitTooLarge { requested: 11, max: 10 }
        ));
    }

    #[test]
    fn test_consonant_reuse_rejected() {
        let ws = words();
        let mut line = CvcLine::new(10, 0, 0).unwrap();

        assert!(line.add_item(&ws[0]).0); // AAB uses A and B
        // BAG reuses B in the c1 slot
        assert!(!line.add_item(&ws[11]).0);
        // KEB reuses B in the c2 slot
        assert!(!line.add_item(&ws[12]).0);
        assert_eq!(line.count(), 1);
    }

    #[test]
    fn test_vowel_used_at_most_twice() {
        let ws = words();
        let mut line = CvcLine::new(10, 0, 0).unwrap();

        assert!(line.add_item(&ws[0]).0); // vowel A
        assert!(line.add_item(&ws[5]).0); // vowel A again
        // RAZ would be the third A
        assert!(!line.add_item(&ws[10]).0);
        assert_eq!(line.count(), 2);
    }

    #[test]
    fn test_freq_balance_exact_above_count() {
        let ws = words();
        // limit 4, cutoff 40, exactly 2 words must end up above the cutoff
        let mut line = CvcLine::new(4, 40, 2).unwrap();

        assert!(line.add_item(&ws[0]).0); // 9, below
        assert!(line.add_item(&ws[1]).0); // 19, below
        assert!(line.add_item(&ws[5]).0); // 59, above (above-count now 1)

        // 39 is below the cutoff and would fill the line with only 1 above
        let (added, _) = line.add_item(&ws[3]);
        assert!(!added);

        // 69 completes the line with exactly 2 above-cutoff words
        let (added, full) = line.add_item(&ws[6]);
        assert!(added);
        assert!(full);
        assert_eq!(line.above_cutoff_count(40), 2);
    }

    #[test]
    fn test_freq_balance_rejects_excess_above() {
        let ws = words();
        // limit 2, cutoff 40, only 1 word may be above
        let mut line = CvcLine::new(2, 40, 1).unwrap();

        assert!(line.add_item(&ws[5]).0); // 59, above
        // 69 would be a second above-cutoff word
        assert!(!line.add_item(&ws[6]).0);
    }

    #[test]
    fn test_full_line_of_ten() {
        let ws = words();
        let mut line = CvcLine::new(10, 0, 0).unwrap();
        for w in &ws[0..10] {
            assert!(line.add_item(w).0);
        }
        assert!(line.is_full());
        assert!(line.contains_text("AAB"));
        assert!(!line.contains_text("RAZ"));

        let (added, full) = line.add_item(&ws[10]);
        assert!(!added);
        assert!(full);
    }

    #[test]
    fn test_clone_is_independent() {
        let ws = words();
        let mut line = CvcLine::new(4, 0, 0).unwrap();
        line.add_item(&ws[0]);
        line.add_item(&ws[1]);

        let mut copy = line.clone();
        copy.add_item(&ws[2]);

        assert_eq!(line.count(), 2);
        assert_eq!(copy.count(), 3);
        // The original still accepts the word the copy took.
        assert!(line.add_item(&ws[2]).0);
    }

    #[test]
    fn test_display_rendering() {
        let ws = words();
        let mut line = CvcLine::new(4, 0, 0).unwrap();
        line.add_item(&ws[0]);
        line.add_item(&ws[1]);
        assert_eq!(format!("{line}"), "[AAB, CED]");
        assert_eq!(line.render_with_freq(), "[AAB:9, CED:19]");
    }
}
