//! Integration tests for the CVC group search.
//!
//! These drive the complete pipeline — inventory classification, pool
//! construction, and the concurrent search — in both spawn modes, and pin
//! down the stop conditions (quota, exhaustion, timeout).

use std::sync::Arc;
use std::time::Duration;

use cvcwords::config::SearchConfig;
use cvcwords::inventory::{build_pool, parse_records, LetterSet};
use cvcwords::pool::CvcPool;
use cvcwords::search::{run_search, SearchStatus};
use cvcwords::word::CvcWord;

fn vowels() -> LetterSet {
    LetterSet::parse_from_str("A: 0\nE: 0\nI: 0\nO: 0\nU: 0")
}

/// Thirteen words with mostly disjoint consonants, vowels cycling A–U.
const WORD_LIST: &str = "AAB: 9\nCED: 19\nFIG: 29\nJOK: 39\nLUM: 49\nNAP: 59\n\
                         QER: 69\nSIT: 79\nVOW: 89\nXUY: 99\nRAZ: 109\nBAG: 119\nKEB: 129";

fn fixture_pool() -> CvcPool {
    build_pool(&parse_records(WORD_LIST), &vowels()).unwrap()
}

/// Count the completed lines in a rendering (one `:[` per numbered line).
fn line_count(rendering: &str) -> usize {
    rendering.matches(":[").count()
}

#[test]
fn test_finds_groups_direct_mode() {
    let config = SearchConfig {
        line_limit: 2,
        per_line_limit: 2,
        freq_cutoff: 0,
        freq_above: 0,
        max_results: 5,
        time_budget: Duration::from_secs(30),
        use_pool: false,
        ..SearchConfig::default()
    };
    let result = run_search(fixture_pool(), &config).unwrap();

    assert!(!result.groups.is_empty());
    assert!(result.groups.len() <= 5);
    assert!(!matches!(result.status, SearchStatus::TimedOut { .. }));

    for rendering in &result.groups {
        // Two full lines of two words each.
        assert_eq!(line_count(rendering), 2, "unexpected rendering: {rendering}");
        assert_eq!(rendering.matches(", ").count(), 2);
    }

    assert_eq!(result.stats.completed, result.groups.len());
    assert!(result.stats.branches >= result.groups.len());
    assert!(result.stats.max_depth >= 3);
}

#[test]
fn test_finds_groups_worker_pool_mode() {
    let config = SearchConfig {
        line_limit: 2,
        per_line_limit: 2,
        freq_cutoff: 0,
        freq_above: 0,
        max_results: 5,
        time_budget: Duration::from_secs(30),
        use_pool: true,
        worker_count: 4,
        ..SearchConfig::default()
    };
    let result = run_search(fixture_pool(), &config).unwrap();

    assert!(!result.groups.is_empty());
    assert!(result.groups.len() <= 5);
    assert!(!matches!(result.status, SearchStatus::TimedOut { .. }));
    for rendering in &result.groups {
        assert_eq!(line_count(rendering), 2, "unexpected rendering: {rendering}");
    }
}

#[test]
fn test_too_small_pool_is_exhausted_immediately() {
    let records = parse_records("AAB: 9\nCED: 19\nFIG: 29");
    let pool = build_pool(&records, &vowels()).unwrap();

    let config = SearchConfig {
        line_limit: 2,
        per_line_limit: 2,
        freq_cutoff: 0,
        freq_above: 0,
        max_results: 5,
        time_budget: Duration::from_secs(30),
        ..SearchConfig::default()
    };
    let result = run_search(pool, &config).unwrap();

    // Three words can never fill four slots: the seed branch is pruned by
    // the feasibility check and the run drains without touching the budget.
    assert!(result.groups.is_empty());
    assert_eq!(result.status, SearchStatus::PoolExhausted);
    assert_eq!(result.stats.branches, 1);
    assert!(result.stats.elapsed < Duration::from_secs(5));
}

#[test]
fn test_frequency_balance_shapes_every_group() {
    // One line of two with exactly one word above the cutoff. The pool
    // offers two below-cutoff words and a single above-cutoff one, so every
    // completed group must contain QER. The full walk is deterministic:
    // the branches seeded with AAB and CED each complete one group, and the
    // branch seeded with QER inherits an empty pool and is pruned.
    let records = parse_records("AAB: 9\nCED: 19\nQER: 69");
    let pool = build_pool(&records, &vowels()).unwrap();

    let config = SearchConfig {
        line_limit: 1,
        per_line_limit: 2,
        freq_cutoff: 40,
        freq_above: 1,
        max_results: 3,
        time_budget: Duration::from_secs(30),
        ..SearchConfig::default()
    };
    let result = run_search(pool, &config).unwrap();

    assert_eq!(result.groups.len(), 2);
    assert_eq!(result.status, SearchStatus::PoolExhausted);
    assert_eq!(result.stats.branches, 4);
    for rendering in &result.groups {
        assert!(rendering.contains("QER:69"), "missing above-cutoff word: {rendering}");
    }
}

#[test]
fn test_quota_stops_the_search() {
    let config = SearchConfig {
        line_limit: 1,
        per_line_limit: 2,
        freq_cutoff: 0,
        freq_above: 0,
        max_results: 1,
        time_budget: Duration::from_secs(30),
        ..SearchConfig::default()
    };
    let result = run_search(fixture_pool(), &config).unwrap();

    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.status, SearchStatus::FoundEnough);
}

#[test]
fn test_time_budget_stops_a_deep_search() {
    // 2000 compatible words and a 150-slot group: a completion needs a chain
    // of 150 forks, each copying the whole pool, far more work than a 1 ms
    // budget allows.
    let mut pool = CvcPool::new();
    let vowel_cycle = ["A", "E", "I", "O", "U"];
    for i in 0..2000 {
        let word = CvcWord::new(
            &format!("L{i}"),
            vowel_cycle[i % vowel_cycle.len()],
            &format!("R{i}"),
            i as i32,
        );
        pool.add(Arc::new(word));
    }

    let config = SearchConfig {
        line_limit: 15,
        per_line_limit: 10,
        freq_cutoff: 0,
        freq_above: 0,
        max_results: 1,
        time_budget: Duration::from_millis(1),
        worker_count: 1,
        ..SearchConfig::default()
    };
    let result = run_search(pool, &config).unwrap();

    assert!(matches!(result.status, SearchStatus::TimedOut { .. }));
    assert!(result.groups.is_empty());
    // The drain must still settle promptly once the stop flag is up.
    assert!(result.stats.elapsed < Duration::from_secs(10));
}

#[test]
fn test_verbose_renderings_include_line_dumps() {
    let config = SearchConfig {
        line_limit: 1,
        per_line_limit: 2,
        freq_cutoff: 0,
        freq_above: 0,
        max_results: 1,
        time_budget: Duration::from_secs(30),
        verbose: true,
        ..SearchConfig::default()
    };
    let result = run_search(fixture_pool(), &config).unwrap();

    assert_eq!(result.groups.len(), 1);
    let rendering = &result.groups[0];
    assert!(rendering.contains("consonants:"), "missing dump: {rendering}");
    assert!(rendering.contains("freq_cutoff:"));
}
