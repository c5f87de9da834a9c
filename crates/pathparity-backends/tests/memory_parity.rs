//! Standard corpus against pairs of in-memory stores

use pathparity_backends::{MemoryBackend, PathStyle};
use pathparity_core::{analyze, AnalysisReport, BackendId, Corpus, Operation, PathPattern};
use pathparity_probe::{CancelSignal, ConsistencyWait, ProbeRunner};
use std::sync::Arc;
use std::time::Duration;

async fn run_pair(a: MemoryBackend, b: MemoryBackend) -> AnalysisReport {
    let corpus = Corpus::standard().unwrap();
    let runner = |backend, store: MemoryBackend| {
        ProbeRunner::new(backend, Arc::new(store))
            .with_wait(ConsistencyWait::Immediate)
            .with_scenario_delay(Duration::ZERO)
    };

    let run_a = runner(BackendId::A, a)
        .run_corpus(&corpus, CancelSignal::never())
        .await;
    let run_b = runner(BackendId::B, b)
        .run_corpus(&corpus, CancelSignal::never())
        .await;
    assert_eq!(run_a.records.len(), corpus.len());
    assert_eq!(run_b.records.len(), corpus.len());

    let report = analyze(&corpus, &run_a.records, &run_b.records).unwrap();
    report.check_invariants().unwrap();
    report
}

fn comparison<'a>(report: &'a AnalysisReport, name: &str) -> &'a pathparity_core::Comparison {
    report
        .comparisons
        .iter()
        .find(|c| c.scenario_name == name)
        .unwrap()
}

#[tokio::test]
async fn same_style_is_identical_everywhere() {
    let report = run_pair(
        MemoryBackend::new(PathStyle::Normalizing),
        MemoryBackend::new(PathStyle::Normalizing),
    )
    .await;

    assert_eq!(report.summary.different, 0);
    assert_eq!(report.summary.identical, report.summary.total);
    assert!(report.summary.critical_scenario_names.is_empty());
}

#[tokio::test]
async fn literal_and_normalizing_diverge_on_key_resolution() {
    let report = run_pair(
        MemoryBackend::new(PathStyle::Literal),
        MemoryBackend::new(PathStyle::Normalizing),
    )
    .await;

    assert!(comparison(&report, "Absolute path with leading slash").behavior_match);
    assert!(comparison(&report, "All paths without leading slash").behavior_match);

    let root = comparison(&report, "Root-relative paths");
    assert!(!root.behavior_match);
    assert!(!root.critical_difference);
    let diff = root
        .path_resolution_differences
        .iter()
        .find(|d| d.candidate_path == "users/user2/name")
        .unwrap();
    assert!(!diff.found_a);
    assert!(diff.found_b);

    assert!(!comparison(&report, "Mixed slash patterns").behavior_match);
    assert!(report.summary.critical_scenario_names.is_empty());
    assert!(report.by_operation[&Operation::BatchUpdate]
        .failing_scenarios
        .contains(&"Root-relative paths".to_string()));
}

#[tokio::test]
async fn rejected_double_slashes_are_critical() {
    let report = run_pair(
        MemoryBackend::new(PathStyle::Normalizing),
        MemoryBackend::new(PathStyle::Normalizing).with_reject_containing(vec!["//".to_string()]),
    )
    .await;

    let critical = &report.summary.critical_scenario_names;
    assert!(critical.contains(&"Path with double slashes".to_string()));
    assert!(critical.contains(&"Partial update under double-slash base".to_string()));
    assert!(critical.contains(&"Edge case - double slashes".to_string()));
    assert_eq!(critical.len(), 3);

    let double = report.by_path_pattern[&PathPattern::DoubleSlash];
    assert_eq!(double.matches, 0);
    assert_eq!(double.differences, 3);
}
