//! Property tests for candidate resolution, classification and aggregation.

use chrono::Utc;
use indexmap::IndexMap;
use pathparity_core::{
    aggregate, aggregate_parallel, analyze, compare, resolve_candidates, BackendId, Comparison,
    Corpus, KeyProbe, Observation, Operation, PathPattern, ProbeRecord,
};
use proptest::prelude::*;
use serde_json::json;

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,6}"
}

fn relative_path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..4).prop_map(|segs| segs.join("/"))
}

fn comparison() -> impl Strategy<Value = Comparison> {
    (
        "[a-z]{1,8}",
        prop_oneof![
            Just("/".to_string()),
            Just(String::new()),
            Just("//a".to_string()),
            Just("/a/b".to_string()),
            Just("a/b".to_string()),
        ],
        prop_oneof![
            Just(Operation::Write),
            Just(Operation::PartialUpdate),
            Just(Operation::BatchUpdate),
        ],
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(name, path, operation, matched, critical)| Comparison {
            scenario_name: name,
            path_used: path,
            operation,
            behavior_match: matched && !critical,
            critical_difference: critical,
            difference_detail: String::new(),
            path_resolution_differences: Vec::new(),
        })
}

proptest! {
    #[test]
    fn prop_relative_key_under_plain_base(base in relative_path(), key in relative_path()) {
        let candidates = resolve_candidates(&base, &key);
        prop_assert_eq!(candidates, [format!("{base}/{key}"), key.clone()]);
    }

    #[test]
    fn prop_resolver_always_yields_two(base in ".{0,12}", key in ".{0,12}") {
        let candidates = resolve_candidates(&base, &key);
        prop_assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn prop_double_slash_wins_over_leading_slash(tail in relative_path()) {
        let path = format!("//{tail}");
        prop_assert_eq!(PathPattern::classify(&path), PathPattern::DoubleSlash);
    }

    #[test]
    fn prop_aggregate_is_idempotent(items in prop::collection::vec(comparison(), 0..40)) {
        let first = serde_json::to_string(&aggregate(items.clone())).unwrap();
        let second = serde_json::to_string(&aggregate(items)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_aggregate_counts_ignore_order(
        (items, shuffled) in prop::collection::vec(comparison(), 0..40)
            .prop_flat_map(|items| (Just(items.clone()), Just(items).prop_shuffle())),
    ) {
        let original = aggregate(items);
        let reordered = aggregate_parallel(shuffled);
        prop_assert_eq!(&original.summary.total, &reordered.summary.total);
        prop_assert_eq!(&original.summary.identical, &reordered.summary.identical);
        prop_assert_eq!(&original.summary.different, &reordered.summary.different);
        prop_assert_eq!(&original.by_path_pattern, &reordered.by_path_pattern);
        for (op, stats) in &original.by_operation {
            prop_assert_eq!(stats.bucket(), reordered.by_operation[op].bucket());
        }
    }

    #[test]
    fn prop_report_never_critical_and_matching(items in prop::collection::vec(comparison(), 0..40)) {
        let report = aggregate(items);
        prop_assert!(report.check_invariants().is_ok());
        prop_assert!(report
            .comparisons
            .iter()
            .all(|c| !(c.critical_difference && c.behavior_match)));
    }
}

fn record(name: &str, backend: BackendId, base: &str, key: &str) -> ProbeRecord {
    let candidates = resolve_candidates(base, key).to_vec();
    ProbeRecord {
        scenario_name: name.to_string(),
        backend,
        path_used: base.to_string(),
        operation: Operation::BatchUpdate,
        write_succeeded: true,
        write_error: None,
        error_kind: None,
        probes: vec![KeyProbe {
            update_key: key.to_string(),
            candidates,
        }],
        verification: IndexMap::new(),
        base_value: None,
        duration_ms: 0,
        recorded_at: Utc::now(),
    }
}

#[test]
fn root_base_relative_key_divergence_lists_both_candidates() {
    let mut a = record("Root-relative paths", BackendId::A, "/", "users/u1");
    a.verification
        .insert("users/u1".to_string(), Observation::found(json!("User One")));
    a.verification
        .insert("/users/u1".to_string(), Observation::missing());

    let mut b = record("Root-relative paths", BackendId::B, "/", "users/u1");
    b.verification
        .insert("users/u1".to_string(), Observation::missing());
    b.verification
        .insert("/users/u1".to_string(), Observation::found(json!("User One")));

    assert_eq!(a.probes[0].candidates, vec!["users/u1", "/users/u1"]);

    let cmp = compare(&a, &b).unwrap();
    assert!(!cmp.behavior_match);
    assert!(!cmp.critical_difference);
    assert_eq!(cmp.path_resolution_differences.len(), 2);
    assert_eq!(cmp.path_resolution_differences[0].candidate_path, "users/u1");
    assert!(cmp.path_resolution_differences[0].found_a);
    assert!(!cmp.path_resolution_differences[0].found_b);
    assert_eq!(cmp.path_resolution_differences[1].candidate_path, "/users/u1");
    assert!(!cmp.path_resolution_differences[1].found_a);
    assert!(cmp.path_resolution_differences[1].found_b);
}

#[test]
fn analyze_rejects_records_for_unknown_scenarios() {
    let corpus = Corpus::standard().unwrap();
    let a = vec![record("not in corpus", BackendId::A, "/", "x")];
    let err = analyze(&corpus, &a, &[]).unwrap_err();
    assert_eq!(err.scenario_name(), "not in corpus");
}

#[test]
fn analyze_skips_one_sided_scenarios() {
    let corpus = Corpus::standard().unwrap();
    let a = vec![
        record("Root-relative paths", BackendId::A, "/", "x"),
        record("Empty base path", BackendId::A, "", "x"),
    ];
    let b = vec![record("Root-relative paths", BackendId::B, "/", "x")];
    let report = analyze(&corpus, &a, &b).unwrap();
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.comparisons[0].scenario_name, "Root-relative paths");
}
