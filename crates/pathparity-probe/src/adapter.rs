//! Backend adapter capability
//!
//! The Probe Runner sees a backend only through [`BackendAdapter`]: three
//! write shapes, a read and an optional delete. Adapters are constructed
//! explicitly and injected, one instance per backend.

use crate::error::AdapterError;
use async_trait::async_trait;
use pathparity_core::Updates;
use serde_json::Value;

/// Result of reading one location
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    /// Whether a value exists at the location
    pub found: bool,
    /// Value read, `null` when absent
    pub value: Value,
}

impl ReadOutcome {
    /// A value is present
    #[inline]
    #[must_use]
    pub fn found(value: Value) -> Self {
        Self { found: true, value }
    }

    /// Nothing at the location
    #[inline]
    #[must_use]
    pub fn missing() -> Self {
        Self {
            found: false,
            value: Value::Null,
        }
    }

    /// Treat JSON `null` as absence
    #[inline]
    #[must_use]
    pub fn from_nullable(value: Value) -> Self {
        if value.is_null() {
            Self::missing()
        } else {
            Self::found(value)
        }
    }
}

/// Minimal write/read capability of one key-value store client
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Short adapter name recorded in probe runs
    fn name(&self) -> &'static str;

    /// Overwrite the value at `path`
    async fn write(&self, path: &str, value: &Value) -> Result<(), AdapterError>;

    /// Merge `updates` into the node at `base_path`
    async fn partial_update(&self, base_path: &str, updates: &Updates)
        -> Result<(), AdapterError>;

    /// Apply `updates` as a multi-location update relative to `base_path`
    async fn batch_update(&self, base_path: &str, updates: &Updates) -> Result<(), AdapterError>;

    /// Read the value at `path`
    async fn read(&self, path: &str) -> Result<ReadOutcome, AdapterError>;

    /// Remove the value at `path`
    async fn delete(&self, path: &str) -> Result<(), AdapterError> {
        Err(AdapterError::unsupported(format!("delete of '{path}'")))
    }

    /// Address of the backing store, if the adapter can name one
    ///
    /// Adapters reporting the same key read and write the same data.
    fn store_key(&self) -> Option<String> {
        None
    }
}
