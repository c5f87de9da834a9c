//! Persisted analysis artifact

use chrono::{DateTime, Utc};
use pathparity_core::{AnalysisReport, BackendId};
use pathparity_probe::ProbeRun;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Which probe run fed an analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSource {
    /// Backend probed
    pub backend: BackendId,
    /// Run id
    pub run_id: Ulid,
    /// Adapter name
    pub adapter: String,
    /// Whether the run was interrupted
    pub cancelled: bool,
    /// Records in the run
    pub records: usize,
}

impl From<&ProbeRun> for RunSource {
    fn from(run: &ProbeRun) -> Self {
        Self {
            backend: run.backend,
            run_id: run.run_id,
            adapter: run.adapter.clone(),
            cancelled: run.cancelled,
            records: run.records.len(),
        }
    }
}

/// An [`AnalysisReport`] plus provenance, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAnalysis {
    /// When the analysis was produced
    pub generated_at: DateTime<Utc>,
    /// Runs the analysis was computed from
    pub sources: Vec<RunSource>,
    /// The report itself
    #[serde(flatten)]
    pub report: AnalysisReport,
}

impl PersistedAnalysis {
    /// Wrap a report computed from `runs`
    #[must_use]
    pub fn new(report: AnalysisReport, runs: &[&ProbeRun]) -> Self {
        Self {
            generated_at: Utc::now(),
            sources: runs.iter().map(|run| RunSource::from(*run)).collect(),
            report,
        }
    }

    /// Whether any source run was interrupted
    #[inline]
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.sources.iter().any(|s| s.cancelled)
    }

    /// Source for one backend
    #[must_use]
    pub fn source(&self, backend: BackendId) -> Option<&RunSource> {
        self.sources.iter().find(|s| s.backend == backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathparity_core::{aggregate, Operation};
    use pathparity_test_utils::comparison;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_fields_sit_at_top_level() {
        let report = aggregate(vec![comparison("x", "//a", Operation::Write, false, true)]);
        let run = ProbeRun::new(BackendId::A, "memory-literal", Utc::now(), true, Vec::new());
        let analysis = PersistedAnalysis::new(report, &[&run]);

        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["summary"]["total"], 1);
        assert_eq!(value["byPathPattern"]["doubleSlash"]["differences"], 1);
        assert_eq!(value["sources"][0]["adapter"], "memory-literal");
        assert!(value["generatedAt"].is_string());

        let back: PersistedAnalysis = serde_json::from_value(value).unwrap();
        assert_eq!(back, analysis);
        assert!(back.is_partial());
        assert!(back.source(BackendId::B).is_none());
    }
}
