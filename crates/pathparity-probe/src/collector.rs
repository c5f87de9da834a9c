//! Append-only results collector
//!
//! Records land here as soon as a scenario finishes, so an interrupted run
//! keeps every record completed before the interrupt.

use parking_lot::Mutex;
use pathparity_core::ProbeRecord;

/// Exclusive-append sink for probe records
#[derive(Debug, Default)]
pub struct ResultsCollector {
    records: Mutex<Vec<ProbeRecord>>,
}

impl ResultsCollector {
    /// Create an empty collector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished record
    pub fn push(&self, record: ProbeRecord) {
        self.records.lock().push(record);
    }

    /// Records collected so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing was collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Take ownership of the collected records
    #[must_use]
    pub fn into_records(self) -> Vec<ProbeRecord> {
        self.records.into_inner()
    }
}
