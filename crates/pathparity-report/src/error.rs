//! Errors raised while loading prior artifacts for analysis

use pathparity_core::BackendId;
use std::path::PathBuf;

/// Missing or unreadable input for an analysis or report
#[derive(Debug, thiserror::Error)]
pub enum AnalysisInputError {
    /// No persisted probe run for a backend
    #[error("no probe run found for backend {backend}")]
    NoRecords { backend: BackendId },

    /// No persisted analysis
    #[error("no analysis found")]
    NoAnalysis,

    /// Artifact exists but does not parse
    #[error("malformed artifact {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Artifact could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AnalysisInputError {
    /// Whether the caller simply has not produced the input yet
    #[inline]
    #[must_use]
    pub fn is_nothing_to_analyze(&self) -> bool {
        matches!(self, Self::NoRecords { .. } | Self::NoAnalysis)
    }

    /// Command that would produce the missing input
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoRecords {
                backend: BackendId::A,
            } => Some("pathparity run-a"),
            Self::NoRecords {
                backend: BackendId::B,
            } => Some("pathparity run-b"),
            Self::NoAnalysis => Some("pathparity analyze"),
            Self::Malformed { .. } | Self::Io { .. } => None,
        }
    }
}
