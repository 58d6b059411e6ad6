//! `inventory` — loading and classifying the raw word inventory.
//!
//! Input files use the `WORD: freq` format (one record per line, the word
//! token optionally ending in `:`, frequency as an integer). The vowel and
//! consonant alphabets arrive in the same format; only membership matters
//! for them, so they load into a [`LetterSet`].
//!
//! Parsing is forgiving the way the rest of the loaders in this family are:
//! blank and malformed lines are skipped silently. *Classification* is not —
//! a word that cannot be split into consonant/vowel/consonant parts, or
//! whose rebuilt canonical text differs from the source record, aborts pool
//! construction with a fatal [`ConfigError`].
//!
//! The split rule: the first vowel at index ≥ 1 becomes the `v` part, what
//! precedes it is `c1`, what follows is `c2` (which must be non-empty).
//! `AAB` therefore splits as `A/A/B` — a leading vowel letter can serve in
//! the consonant slot; only per-line uniqueness constrains it later.

use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::ConfigError;
use crate::pool::CvcPool;
use crate::word::CvcWord;

/// A membership set for one alphabet (vowels or consonants).
#[derive(Debug, Clone, Default)]
pub struct LetterSet {
    letters: HashSet<String>,
}

impl LetterSet {
    /// Parse an alphabet from `LETTER: n` lines. Frequencies are ignored;
    /// malformed lines are skipped.
    pub fn parse_from_str(contents: &str) -> LetterSet {
        let letters = parse_records(contents)
            .into_iter()
            .map(|r| r.text)
            .collect();
        LetterSet { letters }
    }

    /// Read an alphabet file from disk and parse it.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if unable to read a file at `path`.
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<LetterSet> {
        let path_ref = path.as_ref();
        let data = std::fs::read_to_string(path_ref).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("failed to read letter set from '{}': {}", path_ref.display(), e),
            )
        })?;
        Ok(Self::parse_from_str(&data))
    }

    pub fn contains(&self, letter: &str) -> bool {
        self.letters.contains(letter)
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Sorted rendering for diagnostics: `A, E, I, O, U`.
    pub fn ordered(&self) -> String {
        let mut sorted: Vec<&str> = self.letters.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.join(", ")
    }
}

/// One raw `(text, frequency)` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub text: String,
    pub freq: i32,
}

/// Parse `WORD: freq` records, skipping blank and malformed lines.
pub fn parse_records(contents: &str) -> Vec<WordRecord> {
    contents
        .lines()
        .filter_map(|raw_line| {
            let line = raw_line.trim();
            if line.is_empty() {
                return None;
            }
            let mut parts = line.split_whitespace();
            let text = parts.next()?.trim_end_matches(':');
            let freq: i32 = parts.next()?.parse().ok()?;
            if text.is_empty() {
                return None;
            }
            Some(WordRecord { text: text.to_string(), freq })
        })
        .collect()
}

/// Read a word-list file from disk and parse it.
///
/// # Errors
///
/// Will return an `Error` if unable to read a file at `path`.
pub fn load_records<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Vec<WordRecord>> {
    let path_ref = path.as_ref();
    let data = std::fs::read_to_string(path_ref).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("failed to read word list from '{}': {}", path_ref.display(), e),
        )
    })?;
    Ok(parse_records(&data))
}

/// Split a record's text at its first vowel (index ≥ 1).
fn split_word<'a>(text: &'a str, vowels: &LetterSet) -> Result<(&'a str, &'a str, &'a str), ConfigError> {
    for (i, ch) in text.char_indices().skip(1) {
        let end = i + ch.len_utf8();
        if vowels.contains(&text[i..end]) {
            if end >= text.len() {
                // no trailing consonant part
                break;
            }
            return Ok((&text[..i], &text[i..end], &text[end..]));
        }
    }
    Err(ConfigError::MalformedWord { word: text.to_string() })
}

/// Classify raw records against the vowel alphabet and build the initial
/// pool. Duplicate texts become distinct pool entries on purpose: the pool
/// tracks instances, and group-level deduplication happens by text during
/// the search.
///
/// # Errors
///
/// Returns a [`ConfigError`] for a record with no usable vowel split, or
/// when the rebuilt canonical text does not match the source record.
pub fn build_pool(records: &[WordRecord], vowels: &LetterSet) -> Result<CvcPool, ConfigError> {
    let mut pool = CvcPool::new();
    for record in records {
        let (c1, v, c2) = split_word(&record.text, vowels)?;
        let word = CvcWord::new(c1, v, c2, record.freq);
        if word.canonical() != record.text {
            return Err(ConfigError::RebuildMismatch {
                source_text: record.text.clone(),
                rebuilt: word.canonical().to_string(),
            });
        }
        pool.add(Arc::new(word));
    }
    Ok(pool)
}
