//! Vanity address generator tests

use crate::search::{PatternMatcher, SearchError, VanityGenerator, VanityOptions};
use proptest::prelude::*;
use solana_sdk::signer::Signer;

fn options(prefix: Option<&str>, suffix: Option<&str>) -> VanityOptions {
    VanityOptions {
        prefix: prefix.map(str::to_string),
        suffix: suffix.map(str::to_string),
        case_insensitive: false,
        max_attempts: None,
        threads: 2,
    }
}

#[test]
fn test_short_prefix_found_and_verified() {
    let mut opts = options(Some("a"), None);
    opts.max_attempts = Some(200_000);
    let generator = VanityGenerator::new(opts).unwrap();
    let result = generator.run(None).expect("one-char prefix must be found");

    // Post-hoc verification: the address really starts with the pattern
    // and really belongs to the returned keypair.
    assert!(result.address.starts_with('a'));
    assert_eq!(result.keypair.pubkey().to_string(), result.address);
    assert!(result.attempts >= 1);
}

#[test]
fn test_case_insensitive_suffix_found() {
    let mut opts = options(None, Some("Q"));
    opts.case_insensitive = true;
    opts.max_attempts = Some(500_000);
    let generator = VanityGenerator::new(opts).unwrap();
    let result = generator.run(None).expect("folded one-char suffix must be found");
    let last = result.address.chars().last().unwrap();
    assert!(last.eq_ignore_ascii_case(&'q'));
}

#[test]
fn test_exhaustion_returns_none_with_exact_attempt_count() {
    // '1111' requires four leading zero-ish bytes; effectively unreachable
    // in 500 attempts, so the budget is always exhausted.
    let mut opts = options(Some("1111"), None);
    opts.max_attempts = Some(500);
    let generator = VanityGenerator::new(opts).unwrap();
    assert!(generator.run(None).is_none());
    assert_eq!(generator.attempts(), 500);
}

#[test]
fn test_invalid_pattern_characters_rejected() {
    for bad in ["0x", "Ol", "I!"] {
        assert!(matches!(
            VanityGenerator::new(options(Some(bad), None)),
            Err(SearchError::InvalidCharacter(_))
        ));
    }
}

#[test]
fn test_difficulty_ceiling_rejected_up_front() {
    assert!(matches!(
        VanityGenerator::new(options(Some("abcdef"), None)),
        Err(SearchError::DifficultyCeiling { .. })
    ));
    // Prefix and suffix difficulties compound
    assert!(matches!(
        VanityGenerator::new(options(Some("abc"), Some("xyz"))),
        Err(SearchError::DifficultyCeiling { .. })
    ));
}

#[test]
fn test_stop_before_run_and_double_stop() {
    let generator = VanityGenerator::new(options(Some("a"), None)).unwrap();
    generator.stop();
    // stop on an already-stopped generator is a no-op
    generator.stop();
    assert!(generator.run(None).is_none());
    // workers observed the flag before doing meaningful work
    assert!(generator.attempts() <= 2);
}

#[test]
fn test_progress_reports_flow_during_search() {
    let mut opts = options(Some("1111"), None);
    opts.max_attempts = Some(200_000);
    opts.threads = 2;
    let generator = VanityGenerator::new(opts).unwrap();
    let (tx, rx) = crossbeam::channel::bounded(64);
    let result = generator.run(Some(tx));
    assert!(result.is_none());

    let reports: Vec<_> = rx.try_iter().collect();
    assert!(!reports.is_empty());
    for report in &reports {
        assert!(report.attempts <= 200_000);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A matcher built from a real address's own head and tail accepts it
    #[test]
    fn prop_matcher_accepts_own_pattern(
        address in "[1-9A-HJ-NP-Za-km-z]{32,44}",
        head in 1usize..4,
        tail in 1usize..4,
    ) {
        let prefix = address[..head].to_string();
        let suffix = address[address.len() - tail..].to_string();
        let matcher = PatternMatcher::new(Some(prefix), Some(suffix), false).unwrap();
        prop_assert!(matcher.matches(&address));
    }

    /// Case-insensitive matching is a superset of exact matching
    #[test]
    fn prop_folded_match_is_superset(
        address in "[1-9A-HJ-NP-Za-km-z]{32,44}",
        head in 1usize..4,
    ) {
        let prefix = address[..head].to_string();
        let exact = PatternMatcher::new(Some(prefix.clone()), None, false).unwrap();
        let folded = PatternMatcher::new(Some(prefix), None, true).unwrap();
        prop_assert!(exact.matches(&address));
        prop_assert!(folded.matches(&address));
    }
}
