//! Probe records
//!
//! A [`ProbeRecord`] is the immutable evidence one backend produced for one
//! scenario: whether the write succeeded and what each candidate location
//! held afterwards.

use crate::scenario::{KeyProbe, Operation};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Backend under comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BackendId {
    /// First backend (REST-style client)
    A,
    /// Second backend (native client)
    B,
}

impl BackendId {
    /// Both backends
    pub const BOTH: [BackendId; 2] = [BackendId::A, BackendId::B];

    /// Lowercase tag used in file names
    #[inline]
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }
}

impl Display for BackendId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// Classification of an adapter failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AdapterErrorKind {
    /// Connection or I/O failure
    Transport,
    /// Request did not complete in time
    Timeout,
    /// Backend refused the request
    Rejected {
        /// Backend status code, if any
        status: Option<u16>,
    },
    /// Backend refused the path itself
    InvalidPath,
    /// Response could not be decoded
    Decode,
    /// Capability not offered by the adapter
    Unsupported,
}

impl Display for AdapterErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => f.write_str("transport"),
            Self::Timeout => f.write_str("timeout"),
            Self::Rejected { status: Some(code) } => write!(f, "rejected ({code})"),
            Self::Rejected { status: None } => f.write_str("rejected"),
            Self::InvalidPath => f.write_str("invalid path"),
            Self::Decode => f.write_str("decode"),
            Self::Unsupported => f.write_str("unsupported"),
        }
    }
}

/// What a read at one candidate location returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Whether a value exists at the location
    pub found: bool,
    /// Value read, `null` when absent
    pub value: Value,
    /// Read failure, if the read itself failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Observation {
    /// Value present at the location
    #[inline]
    #[must_use]
    pub fn found(value: Value) -> Self {
        Self {
            found: true,
            value,
            error: None,
        }
    }

    /// Nothing at the location
    #[inline]
    #[must_use]
    pub fn missing() -> Self {
        Self {
            found: false,
            value: Value::Null,
            error: None,
        }
    }

    /// The read failed
    #[inline]
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            found: false,
            value: Value::Null,
            error: Some(error.into()),
        }
    }
}

/// Evidence from one backend for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRecord {
    /// Scenario name
    pub scenario_name: String,
    /// Backend that produced the record
    pub backend: BackendId,
    /// Base path of the scenario
    pub path_used: String,
    /// Operation issued
    pub operation: Operation,
    /// Whether the write was accepted
    pub write_succeeded: bool,
    /// Write failure message
    #[serde(default)]
    pub write_error: Option<String>,
    /// Write failure classification
    #[serde(default)]
    pub error_kind: Option<AdapterErrorKind>,
    /// Resolver output per update key
    #[serde(default)]
    pub probes: Vec<KeyProbe>,
    /// Observation per candidate path, in first-probe order
    #[serde(default)]
    pub verification: IndexMap<String, Observation>,
    /// Value at the base path after the write
    #[serde(default)]
    pub base_value: Option<Value>,
    /// Wall time spent on the scenario
    #[serde(default)]
    pub duration_ms: u64,
    /// When the record was completed
    pub recorded_at: DateTime<Utc>,
}

impl ProbeRecord {
    /// Primary (index-0) candidate paths, deduplicated, in probe order
    #[must_use]
    pub fn primary_paths(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for primary in self.probes.iter().filter_map(KeyProbe::primary) {
            if !seen.contains(&primary) {
                seen.push(primary);
            }
        }
        seen
    }

    /// Number of candidate locations that held a value
    #[inline]
    #[must_use]
    pub fn found_count(&self) -> usize {
        self.verification.values().filter(|o| o.found).count()
    }
}
