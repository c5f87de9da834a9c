//! Differential comparator
//!
//! Decides, per scenario, whether two backends behaved identically:
//! 1. Success/failure split -> critical difference
//! 2. Both failed -> match (a differing failure reason is noted, never critical)
//! 3. Both succeeded -> deep equality of the values at the primary candidates
//!
//! Records are compared only at literal paths both sides probed; candidate
//! indices are never used to line up the two records.

use crate::corpus::Corpus;
use crate::error::CorpusIntegrityError;
use crate::record::{BackendId, Observation, ProbeRecord};
use crate::scenario::Operation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One candidate location where the two backends disagree on existence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResolutionDifference {
    /// Candidate location
    pub candidate_path: String,
    /// Whether backend A found a value there
    pub found_a: bool,
    /// Whether backend B found a value there
    pub found_b: bool,
}

/// Cross-backend verdict for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    /// Scenario name
    pub scenario_name: String,
    /// Base path of the scenario
    pub path_used: String,
    /// Operation issued
    pub operation: Operation,
    /// Both backends behaved identically
    pub behavior_match: bool,
    /// Divergence blocks interchangeable use of the backends
    pub critical_difference: bool,
    /// Human-readable explanation, empty when nothing to say
    pub difference_detail: String,
    /// Candidates whose existence differs between the backends
    pub path_resolution_differences: Vec<PathResolutionDifference>,
}

impl Comparison {
    fn new(a: &ProbeRecord) -> Self {
        Self {
            scenario_name: a.scenario_name.clone(),
            path_used: a.path_used.clone(),
            operation: a.operation,
            behavior_match: false,
            critical_difference: false,
            difference_detail: String::new(),
            path_resolution_differences: Vec::new(),
        }
    }
}

/// Compare the records two backends produced for the same scenario
///
/// # Errors
/// - `CorpusIntegrityError::MismatchedRecords` if the records name different scenarios
pub fn compare(a: &ProbeRecord, b: &ProbeRecord) -> Result<Comparison, CorpusIntegrityError> {
    if a.scenario_name != b.scenario_name {
        return Err(CorpusIntegrityError::MismatchedRecords {
            left: a.scenario_name.clone(),
            right: b.scenario_name.clone(),
        });
    }

    let mut comparison = Comparison::new(a);

    match (a.write_succeeded, b.write_succeeded) {
        (true, false) | (false, true) => {
            comparison.critical_difference = true;
            comparison.difference_detail = format!(
                "Success status mismatch: A={}, B={}{}",
                a.write_succeeded,
                b.write_succeeded,
                failure_suffix(a, b)
            );
        }
        (false, false) => {
            comparison.behavior_match = true;
            if failed_for_different_reasons(a, b) {
                comparison.difference_detail = format!(
                    "Both writes rejected for different reasons: A={}, B={}",
                    describe_failure(a),
                    describe_failure(b)
                );
            }
        }
        (true, true) => compare_values(a, b, &mut comparison),
    }

    tracing::debug!(
        scenario = %comparison.scenario_name,
        behavior_match = comparison.behavior_match,
        critical = comparison.critical_difference,
        "compared records"
    );

    Ok(comparison)
}

fn compare_values(a: &ProbeRecord, b: &ProbeRecord, comparison: &mut Comparison) {
    // Union of both sides' primaries, A's order first
    let mut primaries: Vec<&str> = a.primary_paths();
    for path in b.primary_paths() {
        if !primaries.contains(&path) {
            primaries.push(path);
        }
    }
    // Records without a probe layout: every verified path counts as primary
    if primaries.is_empty() {
        primaries = a.verification.keys().map(String::as_str).collect();
    }

    let mut shared = 0usize;
    let mut diverging = Vec::new();
    for path in primaries {
        let (Some(obs_a), Some(obs_b)) = (a.verification.get(path), b.verification.get(path))
        else {
            continue;
        };
        shared += 1;
        if obs_a.value != obs_b.value {
            diverging.push(path);
        }
    }

    if shared == 0 {
        comparison.difference_detail =
            "No primary candidate path was probed by both backends".to_string();
        comparison.path_resolution_differences =
            resolution_differences(&a.verification, &b.verification);
        return;
    }

    if diverging.is_empty() {
        comparison.behavior_match = true;
        return;
    }

    comparison.difference_detail = format!(
        "Data written differs between backends at {}",
        diverging
            .iter()
            .map(|p| format!("`{p}`"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    comparison.path_resolution_differences =
        resolution_differences(&a.verification, &b.verification);
}

/// Join both verification maps on candidate path, keeping existence mismatches
fn resolution_differences(
    a: &IndexMap<String, Observation>,
    b: &IndexMap<String, Observation>,
) -> Vec<PathResolutionDifference> {
    a.iter()
        .filter_map(|(path, obs_a)| {
            let obs_b = b.get(path)?;
            (obs_a.found != obs_b.found).then(|| PathResolutionDifference {
                candidate_path: path.clone(),
                found_a: obs_a.found,
                found_b: obs_b.found,
            })
        })
        .collect()
}

fn failed_for_different_reasons(a: &ProbeRecord, b: &ProbeRecord) -> bool {
    match (a.error_kind, b.error_kind) {
        (Some(kind_a), Some(kind_b)) => kind_a != kind_b,
        (None, None) => a.write_error != b.write_error,
        _ => true,
    }
}

fn describe_failure(record: &ProbeRecord) -> String {
    let message = record.write_error.as_deref().unwrap_or("unknown error");
    match record.error_kind {
        Some(kind) => format!("{kind}: {message}"),
        None => message.to_string(),
    }
}

fn failure_suffix(a: &ProbeRecord, b: &ProbeRecord) -> String {
    let failed = if a.write_succeeded { b } else { a };
    format!(" ({} error: {})", failed.backend, describe_failure(failed))
}

/// Pair both backends' records by scenario name and compare each pair
///
/// Pairs are produced in corpus order. A scenario recorded by only one
/// backend (e.g. after a cancelled run) is skipped.
///
/// # Errors
/// - `CorpusIntegrityError::UnknownScenario` if a record names a scenario outside the corpus
/// - `CorpusIntegrityError::DuplicateRecord` if one backend recorded a scenario twice
pub fn pair_and_compare(
    corpus: &Corpus,
    records_a: &[ProbeRecord],
    records_b: &[ProbeRecord],
) -> Result<Vec<Comparison>, CorpusIntegrityError> {
    let by_name_a = index_records(corpus, BackendId::A, records_a)?;
    let by_name_b = index_records(corpus, BackendId::B, records_b)?;

    let mut comparisons = Vec::with_capacity(by_name_a.len().min(by_name_b.len()));
    for scenario in corpus {
        match (by_name_a.get(scenario.name.as_str()), by_name_b.get(scenario.name.as_str())) {
            (Some(a), Some(b)) => comparisons.push(compare(a, b)?),
            (Some(_), None) | (None, Some(_)) => {
                tracing::info!(scenario = %scenario.name, "recorded by one backend only, skipping");
            }
            (None, None) => {}
        }
    }
    Ok(comparisons)
}

fn index_records<'r>(
    corpus: &Corpus,
    backend: BackendId,
    records: &'r [ProbeRecord],
) -> Result<IndexMap<&'r str, &'r ProbeRecord>, CorpusIntegrityError> {
    let mut by_name = IndexMap::with_capacity(records.len());
    for record in records {
        if !corpus.contains(&record.scenario_name) {
            return Err(CorpusIntegrityError::UnknownScenario(
                record.scenario_name.clone(),
            ));
        }
        if by_name.insert(record.scenario_name.as_str(), record).is_some() {
            return Err(CorpusIntegrityError::DuplicateRecord {
                backend,
                name: record.scenario_name.clone(),
            });
        }
    }
    Ok(by_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AdapterErrorKind;
    use crate::scenario::KeyProbe;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(backend: BackendId, succeeded: bool) -> ProbeRecord {
        ProbeRecord {
            scenario_name: "s".to_string(),
            backend,
            path_used: "/a".to_string(),
            operation: Operation::Write,
            write_succeeded: succeeded,
            write_error: None,
            error_kind: None,
            probes: vec![KeyProbe {
                update_key: "/a".to_string(),
                candidates: vec!["/a".to_string(), "a".to_string()],
            }],
            verification: IndexMap::new(),
            base_value: None,
            duration_ms: 0,
            recorded_at: Utc::now(),
        }
    }

    fn observe(mut rec: ProbeRecord, path: &str, obs: Observation) -> ProbeRecord {
        rec.verification.insert(path.to_string(), obs);
        rec
    }

    #[test]
    fn identical_values_match() {
        let a = observe(record(BackendId::A, true), "/a", Observation::found(json!(1)));
        let b = observe(record(BackendId::B, true), "/a", Observation::found(json!(1)));
        let cmp = compare(&a, &b).unwrap();
        assert!(cmp.behavior_match);
        assert!(!cmp.critical_difference);
        assert!(cmp.difference_detail.is_empty());
    }

    #[test]
    fn records_without_probe_layout_compare_verified_paths() {
        let mut a = observe(record(BackendId::A, true), "/a", Observation::found(json!(1)));
        let mut b = observe(record(BackendId::B, true), "/a", Observation::found(json!(1)));
        a.probes.clear();
        b.probes.clear();
        let cmp = compare(&a, &b).unwrap();
        assert!(cmp.behavior_match);
        assert!(!cmp.critical_difference);
    }

    #[test]
    fn success_mismatch_is_critical() {
        let a = record(BackendId::A, true);
        let mut b = record(BackendId::B, false);
        b.write_error = Some("x".to_string());
        let cmp = compare(&a, &b).unwrap();
        assert!(cmp.critical_difference);
        assert!(!cmp.behavior_match);
        assert!(cmp.difference_detail.contains("A=true, B=false"));
    }

    #[test]
    fn both_failed_match_and_note_different_reasons() {
        let mut a = record(BackendId::A, false);
        a.write_error = Some("bad request".to_string());
        a.error_kind = Some(AdapterErrorKind::Rejected { status: Some(400) });
        let mut b = record(BackendId::B, false);
        b.write_error = Some("invalid path".to_string());
        b.error_kind = Some(AdapterErrorKind::InvalidPath);

        let cmp = compare(&a, &b).unwrap();
        assert!(cmp.behavior_match);
        assert!(!cmp.critical_difference);
        assert!(cmp.difference_detail.contains("different reasons"));
    }

    #[test]
    fn both_failed_for_same_reason_is_silent() {
        let mut a = record(BackendId::A, false);
        a.write_error = Some("denied".to_string());
        let mut b = record(BackendId::B, false);
        b.write_error = Some("denied".to_string());
        let cmp = compare(&a, &b).unwrap();
        assert!(cmp.behavior_match);
        assert!(cmp.difference_detail.is_empty());
    }

    #[test]
    fn value_divergence_is_reported_but_not_critical() {
        let a = observe(
            observe(record(BackendId::A, true), "/a", Observation::found(json!(1))),
            "a",
            Observation::missing(),
        );
        let b = observe(
            observe(record(BackendId::B, true), "/a", Observation::missing()),
            "a",
            Observation::found(json!(1)),
        );
        let cmp = compare(&a, &b).unwrap();
        assert!(!cmp.behavior_match);
        assert!(!cmp.critical_difference);
        assert_eq!(
            cmp.path_resolution_differences,
            vec![
                PathResolutionDifference {
                    candidate_path: "/a".to_string(),
                    found_a: true,
                    found_b: false,
                },
                PathResolutionDifference {
                    candidate_path: "a".to_string(),
                    found_a: false,
                    found_b: true,
                },
            ]
        );
    }

    #[test]
    fn only_commonly_probed_paths_are_compared() {
        let a = observe(
            observe(record(BackendId::A, true), "/a", Observation::found(json!(1))),
            "only-a",
            Observation::found(json!(2)),
        );
        let b = observe(record(BackendId::B, true), "/a", Observation::found(json!(1)));
        let cmp = compare(&a, &b).unwrap();
        assert!(cmp.behavior_match);
    }

    #[test]
    fn no_shared_primary_is_not_a_match() {
        let a = observe(record(BackendId::A, true), "/a", Observation::found(json!(1)));
        let mut b = record(BackendId::B, true);
        b.probes[0].candidates = vec!["z".to_string()];
        let b = observe(b, "z", Observation::found(json!(1)));
        let cmp = compare(&a, &b).unwrap();
        assert!(!cmp.behavior_match);
        assert!(!cmp.critical_difference);
    }

    #[test]
    fn mismatched_names_are_rejected() {
        let a = record(BackendId::A, true);
        let mut b = record(BackendId::B, true);
        b.scenario_name = "other".to_string();
        assert!(matches!(
            compare(&a, &b),
            Err(CorpusIntegrityError::MismatchedRecords { .. })
        ));
    }
}
