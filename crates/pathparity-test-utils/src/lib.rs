//! Testing utilities for the pathparity workspace
//!
//! Shared fixtures for probe records, comparisons and small corpora.

#![allow(missing_docs)]

use chrono::Utc;
use indexmap::IndexMap;
use pathparity_core::{
    AdapterErrorKind, BackendId, Comparison, Corpus, KeyProbe, Observation, Operation,
    ProbeRecord, Scenario,
};
use serde_json::{json, Value};

/// A successful write record whose paths were each their own primary candidate
pub fn success_record(name: &str, backend: BackendId, found: &[(&str, Value)]) -> ProbeRecord {
    let mut record = empty_record(name, backend);
    record.write_succeeded = true;
    for (path, value) in found {
        record.probes.push(KeyProbe {
            update_key: (*path).to_string(),
            candidates: vec![(*path).to_string()],
        });
        record
            .verification
            .insert((*path).to_string(), Observation::found(value.clone()));
    }
    record
}

/// A rejected write record
pub fn failed_record(name: &str, backend: BackendId, error: &str) -> ProbeRecord {
    let mut record = empty_record(name, backend);
    record.write_error = Some(error.to_string());
    record.error_kind = Some(AdapterErrorKind::Rejected { status: Some(400) });
    record
}

fn empty_record(name: &str, backend: BackendId) -> ProbeRecord {
    ProbeRecord {
        scenario_name: name.to_string(),
        backend,
        path_used: "/fixture".to_string(),
        operation: Operation::Write,
        write_succeeded: false,
        write_error: None,
        error_kind: None,
        probes: Vec::new(),
        verification: IndexMap::new(),
        base_value: None,
        duration_ms: 1,
        recorded_at: Utc::now(),
    }
}

/// A bare comparison
pub fn comparison(
    name: &str,
    path: &str,
    operation: Operation,
    matched: bool,
    critical: bool,
) -> Comparison {
    Comparison {
        scenario_name: name.to_string(),
        path_used: path.to_string(),
        operation,
        behavior_match: matched,
        critical_difference: critical,
        difference_detail: if matched {
            String::new()
        } else {
            format!("fixture difference in {name}")
        },
        path_resolution_differences: Vec::new(),
    }
}

/// Three writes covering the leading-slash, relative and root patterns
pub fn small_corpus() -> Corpus {
    Corpus::new(vec![
        Scenario::write("abs", "/fixture/abs", json!({"v": 1})),
        Scenario::write("rel", "fixture/rel", json!({"v": 2})),
        Scenario::write("root", "/", json!({"fixture": {"root": true}})),
    ])
    .unwrap()
}

/// Matching successful records for every scenario in `corpus`
pub fn matching_records(corpus: &Corpus, backend: BackendId) -> Vec<ProbeRecord> {
    corpus
        .scenarios()
        .iter()
        .map(|s| {
            let mut record = success_record(&s.name, backend, &[(s.base_path.as_str(), json!(true))]);
            record.path_used = s.base_path.clone();
            record.operation = s.operation();
            record
        })
        .collect()
}
