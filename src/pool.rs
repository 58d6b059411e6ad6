//! The mutable inventory of candidate words available to a search branch.
//!
//! Membership is keyed on *instance identity* ([`WordId`]), not text — two
//! textually identical words are distinct entries. Every branch owns its own
//! pool; [`Clone`] copies the entry map and the key order while sharing the
//! immutable [`CvcWord`] instances by reference, so copies need no
//! synchronization.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::word::{CvcWord, WordId};

/// A pool of remaining candidate words.
#[derive(Debug, Clone, Default)]
pub struct CvcPool {
    entries: HashMap<WordId, i32>,
    keys: Vec<Arc<CvcWord>>,
}

impl CvcPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a word. Returns false (and changes nothing) if this instance
    /// is already present.
    pub fn add(&mut self, word: Arc<CvcWord>) -> bool {
        if self.entries.contains_key(&word.id()) {
            return false;
        }
        self.entries.insert(word.id(), word.freq());
        self.keys.push(word);
        true
    }

    /// Remove a word by instance identity. Returns false if absent.
    pub fn remove(&mut self, word: &CvcWord) -> bool {
        if self.entries.remove(&word.id()).is_none() {
            return false;
        }
        if let Some(pos) = self.keys.iter().position(|k| k.id() == word.id()) {
            self.keys.remove(pos);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remaining words in insertion order. Branches snapshot this slice
    /// before enumerating, since acceptance removes words mid-loop.
    pub fn words(&self) -> &[Arc<CvcWord>] {
        &self.keys
    }

    /// Counts of words with frequency strictly above the cutoff, and the
    /// rest. Used by the group feasibility check.
    pub fn split_by_cutoff(&self, cutoff: i32) -> (usize, usize) {
        let above = self.entries.values().filter(|&&f| f > cutoff).count();
        (above, self.entries.len() - above)
    }
}

impl fmt::Display for CvcPool {
    /// Ordered rendering for diagnostics, sorted by canonical text:
    /// `AAB:9, CED:19, ...`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted: Vec<&Arc<CvcWord>> = self.keys.iter().collect();
        sorted.sort_by(|a, b| a.canonical().cmp(b.canonical()));
        let out = sorted
            .iter()
            .map(|w| format!("{}:{}", w, w.freq()))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&out)
    }
}
