//! pathparity core - differential path-resolution verification
//!
//! Decides whether two client implementations of a hierarchical key-value
//! store write API resolve ambiguous path strings to the same location with
//! the same value:
//! - Candidate path resolution for ambiguous base/update-key pairs
//! - The scenario corpus of ambiguous writes
//! - Cross-backend comparison of probe records
//! - Aggregation into pattern- and operation-keyed statistics
//!
//! # Example
//!
//! ```rust,ignore
//! use pathparity_core::{analyze, Corpus};
//!
//! let corpus = Corpus::standard()?;
//! let report = analyze(&corpus, &records_a, &records_b)?;
//! println!("{} of {} identical", report.summary.identical, report.summary.total);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod aggregate;
pub mod compare;
pub mod corpus;
pub mod error;
pub mod path;
pub mod record;
pub mod scenario;

// Re-exports for convenience
pub use aggregate::{
    aggregate, aggregate_parallel, AnalysisReport, BucketStats, InvariantViolation,
    OperationStats, Summary,
};
pub use compare::{compare, pair_and_compare, Comparison, PathResolutionDifference};
pub use corpus::{fixture_tree, standard_scenarios, Corpus, FIXTURE_PATH};
pub use error::CorpusIntegrityError;
pub use path::{is_root_base, resolve_candidates, top_level_segment, PathPattern};
pub use record::{AdapterErrorKind, BackendId, Observation, ProbeRecord};
pub use scenario::{updates, KeyProbe, Operation, Scenario, ScenarioKind, Updates};

/// Pair, compare and aggregate both backends' records against a corpus
///
/// # Errors
/// Any [`CorpusIntegrityError`] raised while pairing records.
pub fn analyze(
    corpus: &Corpus,
    records_a: &[ProbeRecord],
    records_b: &[ProbeRecord],
) -> Result<AnalysisReport, CorpusIntegrityError> {
    let comparisons = pair_and_compare(corpus, records_a, records_b)?;
    let report = aggregate(comparisons);
    tracing::info!(
        total = report.summary.total,
        identical = report.summary.identical,
        different = report.summary.different,
        critical = report.summary.critical_scenario_names.len(),
        "analysis complete"
    );
    Ok(report)
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
