//! pathparity report - persisted artifacts and rendering
//!
//! - [`ResultStore`]: timestamp-ordered JSON files with "latest" lookup
//! - [`PersistedAnalysis`]: an analysis report with its source runs
//! - [`AnalysisInputError`]: missing or malformed prior artifacts
//! - Markdown and console rendering

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod artifact;
pub mod error;
pub mod markdown;
pub mod store;

pub use artifact::{PersistedAnalysis, RunSource};
pub use error::AnalysisInputError;
pub use markdown::{render_markdown, render_summary};
pub use store::ResultStore;
