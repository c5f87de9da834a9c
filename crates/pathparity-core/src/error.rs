//! Error types for pathparity core
//!
//! Corpus-level structural errors. These indicate a programming error in the
//! scenario corpus or in record pairing and abort the run.

use crate::record::BackendId;

/// Structural corpus or pairing error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorpusIntegrityError {
    /// Two scenarios share a name
    #[error("duplicate scenario name: '{0}'")]
    DuplicateScenario(String),

    /// A record or comparison names a scenario the corpus does not define
    #[error("unknown scenario: '{0}'")]
    UnknownScenario(String),

    /// Records handed to the comparator describe different scenarios
    #[error("records describe different scenarios: '{left}' vs '{right}'")]
    MismatchedRecords { left: String, right: String },

    /// One backend produced two records for the same scenario
    #[error("backend {backend} produced more than one record for '{name}'")]
    DuplicateRecord { backend: BackendId, name: String },
}

impl CorpusIntegrityError {
    /// Scenario name the error refers to
    #[must_use]
    pub fn scenario_name(&self) -> &str {
        match self {
            Self::DuplicateScenario(name)
            | Self::UnknownScenario(name)
            | Self::DuplicateRecord { name, .. } => name,
            Self::MismatchedRecords { left, .. } => left,
        }
    }
}
