//! pathparity probe - running scenarios against a backend
//!
//! Provides:
//! - The [`BackendAdapter`] capability every backend client implements
//! - [`AdapterError`] with its failure classification
//! - Injectable [`ConsistencyWait`] policies
//! - Cooperative cancellation and an append-only [`ResultsCollector`]
//! - The [`ProbeRunner`] producing [`ProbeRecord`](pathparity_core::ProbeRecord)s
//!   and [`ProbeRun`] envelopes

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod adapter;
pub mod cancel;
pub mod collector;
pub mod error;
pub mod run;
pub mod runner;
pub mod wait;

pub use adapter::{BackendAdapter, ReadOutcome};
pub use cancel::{CancelHandle, CancelSignal};
pub use collector::ResultsCollector;
pub use error::{AdapterError, AdapterErrorKind};
pub use run::{ProbeRun, RunSummary};
pub use runner::{ProbeRunner, DEFAULT_SCENARIO_DELAY};
pub use wait::{ConsistencyWait, WaitOutcome};
