//! The atomic unit of the search: a consonant-vowel-consonant word.
//!
//! A [`CvcWord`] is immutable after construction. Its `canonical` text is the
//! concatenation of the three parts, computed exactly once. Every word also
//! carries a [`WordId`], a process-unique instance identifier: the pool keys
//! membership on the *instance*, so two words with identical text are still
//! two distinct inventory entries (group-level duplicate rejection, by
//! contrast, compares canonical text — see `group.rs`).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Next instance id to hand out. Ids only need to be unique, not dense.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable instance identity for pool membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordId(u64);

/// An immutable CVC word: two consonant parts, one vowel part, the canonical
/// concatenation, and a frequency rank (lower rank = more common).
#[derive(Debug)]
pub struct CvcWord {
    id: WordId,
    c1: String,
    v: String,
    c2: String,
    canonical: String,
    freq: i32,
}

impl CvcWord {
    /// Build a word from its parts. The canonical text is fixed here and
    /// never recomputed.
    pub fn new(c1: &str, v: &str, c2: &str, freq: i32) -> Self {
        let canonical = format!("{c1}{v}{c2}");
        Self {
            id: WordId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            c1: c1.to_string(),
            v: v.to_string(),
            c2: c2.to_string(),
            canonical,
            freq,
        }
    }

    pub fn id(&self) -> WordId {
        self.id
    }

    pub fn c1(&self) -> &str {
        &self.c1
    }

    pub fn vowel(&self) -> &str {
        &self.v
    }

    pub fn c2(&self) -> &str {
        &self.c2
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn freq(&self) -> i32 {
        self.freq
    }

    /// Diagnostic rendering showing the split, e.g. `c[X]:v[E]:c[Z] [XEZ:55]`.
    pub fn dump_string(&self) -> String {
        format!(
            "c[{}]:v[{}]:c[{}] [{}:{}]",
            self.c1, self.v, self.c2, self.canonical, self.freq
        )
    }
}

impl fmt::Display for CvcWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}
