//! Probe run envelope

use chrono::{DateTime, Utc};
use pathparity_core::{BackendId, ProbeRecord};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Record counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records produced
    pub total: usize,
    /// Records whose write succeeded
    pub successful: usize,
}

/// Everything one backend produced for one pass over the corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRun {
    /// Unique, time-ordered run id
    pub run_id: Ulid,
    /// Backend probed
    pub backend: BackendId,
    /// Adapter name
    pub adapter: String,
    /// When the first scenario started
    pub started_at: DateTime<Utc>,
    /// When the run stopped
    pub finished_at: DateTime<Utc>,
    /// Whether the run was interrupted before the corpus was exhausted
    pub cancelled: bool,
    /// Records in corpus order
    pub records: Vec<ProbeRecord>,
    /// Counts over `records`
    pub summary: RunSummary,
}

impl ProbeRun {
    /// Assemble a run from its records
    #[must_use]
    pub fn new(
        backend: BackendId,
        adapter: impl Into<String>,
        started_at: DateTime<Utc>,
        cancelled: bool,
        records: Vec<ProbeRecord>,
    ) -> Self {
        let summary = RunSummary {
            total: records.len(),
            successful: records.iter().filter(|r| r.write_succeeded).count(),
        };
        Self {
            run_id: Ulid::new(),
            backend,
            adapter: adapter.into(),
            started_at,
            finished_at: Utc::now(),
            cancelled,
            records,
            summary,
        }
    }

    /// Wall time of the run in milliseconds
    #[inline]
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathparity_test_utils::{failed_record, success_record};
    use serde_json::json;

    #[test]
    fn summary_counts_successes() {
        let run = ProbeRun::new(
            BackendId::A,
            "memory",
            Utc::now(),
            false,
            vec![
                success_record("one", BackendId::A, &[("/a", json!(1))]),
                failed_record("two", BackendId::A, "rejected"),
            ],
        );
        assert_eq!(run.summary, RunSummary { total: 2, successful: 1 });
        assert!(run.elapsed_ms() >= 0);
    }

    #[test]
    fn run_serializes_camel_case() {
        let run = ProbeRun::new(BackendId::B, "rest", Utc::now(), true, Vec::new());
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["backend"], "B");
        assert_eq!(value["cancelled"], true);
        assert!(value["runId"].is_string());
        assert!(value["startedAt"].is_string());
        let back: ProbeRun = serde_json::from_value(value).unwrap();
        assert_eq!(back, run);
    }
}
