//! Adapter failures
//!
//! An [`AdapterError`] is recovered inside the Probe Runner and recorded as
//! data on the probe record. It never escapes a corpus run.

pub use pathparity_core::AdapterErrorKind;

/// Failure reported by a backend adapter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AdapterError {
    /// Failure classification
    pub kind: AdapterErrorKind,
    /// Backend or transport message
    pub message: String,
}

impl AdapterError {
    /// Create an error of the given kind
    #[inline]
    #[must_use]
    pub fn new(kind: AdapterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Connection or I/O failure
    #[inline]
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Transport, message)
    }

    /// Request timed out
    #[inline]
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Timeout, message)
    }

    /// Backend refused the request
    #[inline]
    #[must_use]
    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Rejected { status }, message)
    }

    /// Backend refused the path
    #[inline]
    #[must_use]
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::InvalidPath, message)
    }

    /// Response body could not be decoded
    #[inline]
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Decode, message)
    }

    /// Capability not offered
    #[inline]
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Unsupported, message)
    }

    /// Whether retrying the same call could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            AdapterErrorKind::Transport | AdapterErrorKind::Timeout => true,
            AdapterErrorKind::Rejected { status } => status.is_some_and(|s| s >= 500 || s == 429),
            AdapterErrorKind::InvalidPath
            | AdapterErrorKind::Decode
            | AdapterErrorKind::Unsupported => false,
        }
    }

    /// Prefix the message with context, keeping the kind
    #[must_use]
    pub fn context(self, context: &str) -> Self {
        Self {
            kind: self.kind,
            message: format!("{context}: {}", self.message),
        }
    }
}
