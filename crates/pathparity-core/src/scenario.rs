//! Scenario model
//!
//! A [`Scenario`] is one named, immutable test case: an operation, the base
//! path it targets and an operation-specific payload.

use crate::path::{resolve_candidates, PathPattern};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Ordered update mapping (key -> value), preserving declaration order
pub type Updates = IndexMap<String, Value>;

/// Write operation exercised by a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Replace the value at a single path
    Write,
    /// Patch children of a base path
    PartialUpdate,
    /// Multi-location update relative to a base path
    BatchUpdate,
}

impl Operation {
    /// Every operation kind
    pub const ALL: [Operation; 3] = [
        Operation::Write,
        Operation::PartialUpdate,
        Operation::BatchUpdate,
    ];

    /// Stable wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Write => "WRITE",
            Self::PartialUpdate => "PARTIAL_UPDATE",
            Self::BatchUpdate => "BATCH_UPDATE",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "write" => Ok(Self::Write),
            "partialupdate" | "patch" => Ok(Self::PartialUpdate),
            "batchupdate" | "batch" | "multipath" => Ok(Self::BatchUpdate),
            other => Err(format!("unknown operation: {other}")),
        }
    }
}

/// Operation-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioKind {
    /// Single write of `value` at the base path
    Write {
        /// Value written
        value: Value,
    },
    /// Partial update of the base path
    PartialUpdate {
        /// Update keys relative to the base
        updates: Updates,
    },
    /// Batch (multi-path) update under the base path
    BatchUpdate {
        /// Update keys relative to the base
        updates: Updates,
    },
}

/// Resolver output for one update key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyProbe {
    /// The update key (or the whole path for single writes)
    pub update_key: String,
    /// Candidate locations, primary first
    pub candidates: Vec<String>,
}

impl KeyProbe {
    /// The primary (index-0) candidate
    #[inline]
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }
}

/// One named test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Unique scenario name
    pub name: String,
    /// Path the operation is issued against
    pub base_path: String,
    /// Operation and payload
    #[serde(flatten)]
    pub kind: ScenarioKind,
    /// Value written to `base_path` before the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Value>,
}

impl Scenario {
    /// Single-write scenario
    #[must_use]
    pub fn write(name: impl Into<String>, path: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            base_path: path.into(),
            kind: ScenarioKind::Write { value },
            seed: None,
        }
    }

    /// Partial-update scenario
    #[must_use]
    pub fn partial_update(
        name: impl Into<String>,
        base_path: impl Into<String>,
        updates: Updates,
    ) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
            kind: ScenarioKind::PartialUpdate { updates },
            seed: None,
        }
    }

    /// Batch-update scenario
    #[must_use]
    pub fn batch_update(
        name: impl Into<String>,
        base_path: impl Into<String>,
        updates: Updates,
    ) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
            kind: ScenarioKind::BatchUpdate { updates },
            seed: None,
        }
    }

    /// Pre-populate the base path before the operation runs
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: Value) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Operation tag
    #[inline]
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self.kind {
            ScenarioKind::Write { .. } => Operation::Write,
            ScenarioKind::PartialUpdate { .. } => Operation::PartialUpdate,
            ScenarioKind::BatchUpdate { .. } => Operation::BatchUpdate,
        }
    }

    /// Ambiguity class of the base path
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> PathPattern {
        PathPattern::classify(&self.base_path)
    }

    /// Update mapping for update operations
    #[inline]
    #[must_use]
    pub fn updates(&self) -> Option<&Updates> {
        match &self.kind {
            ScenarioKind::Write { .. } => None,
            ScenarioKind::PartialUpdate { updates } | ScenarioKind::BatchUpdate { updates } => {
                Some(updates)
            }
        }
    }

    /// Candidate locations to read back after the operation
    ///
    /// Single writes resolve the whole path as a root-relative key; update
    /// operations resolve each update key against the base path.
    #[must_use]
    pub fn probe_targets(&self) -> Vec<KeyProbe> {
        match self.updates() {
            None => vec![KeyProbe {
                update_key: self.base_path.clone(),
                candidates: resolve_candidates("", &self.base_path).to_vec(),
            }],
            Some(updates) => updates
                .keys()
                .map(|key| KeyProbe {
                    update_key: key.clone(),
                    candidates: resolve_candidates(&self.base_path, key).to_vec(),
                })
                .collect(),
        }
    }
}

/// Build an [`Updates`] map from literal pairs, keeping their order
#[must_use]
pub fn updates<const N: usize>(pairs: [(&str, Value); N]) -> Updates {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
