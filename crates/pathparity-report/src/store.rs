//! Timestamp-ordered result files
//!
//! Every artifact is a JSON (or Markdown) file named
//! `<prefix>-<YYYYMMDDTHHMMSSmmmZ>[-<ulid>].<ext>`, so the lexically
//! greatest name with a given prefix is the latest. Analysis ids come from a
//! monotonic generator, so two analyses in the same millisecond still sort in
//! save order.

use crate::artifact::PersistedAnalysis;
use crate::error::AnalysisInputError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pathparity_core::BackendId;
use pathparity_probe::ProbeRun;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ulid::{Generator, Ulid};

const ANALYSIS_PREFIX: &str = "analysis-";
const REPORT_PREFIX: &str = "report-";

/// Directory of persisted runs, analyses and reports
#[derive(Clone)]
pub struct ResultStore {
    dir: PathBuf,
    ids: Arc<Mutex<Generator>>,
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore").field("dir", &self.dir).finish_non_exhaustive()
    }
}

fn run_prefix(backend: BackendId) -> String {
    format!("probe-{}-", backend.tag())
}

fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%3fZ").to_string()
}

impl ResultStore {
    /// Store rooted at `dir`; the directory is created on first write
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ids: Arc::new(Mutex::new(Generator::new())),
        }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a probe run
    ///
    /// # Errors
    /// Any I/O failure creating the directory or writing the file.
    pub fn save_run(&self, run: &ProbeRun) -> io::Result<PathBuf> {
        let name = format!(
            "{}{}-{}.json",
            run_prefix(run.backend),
            stamp(run.finished_at),
            run.run_id
        );
        self.write_json(&name, run)
    }

    /// Load the most recent run for `backend`
    ///
    /// # Errors
    /// - `AnalysisInputError::NoRecords` if no run was persisted
    /// - `AnalysisInputError::Malformed` / `Io` if the latest file is unreadable
    pub fn latest_run(&self, backend: BackendId) -> Result<ProbeRun, AnalysisInputError> {
        let path = self
            .latest(&run_prefix(backend), "json")?
            .ok_or(AnalysisInputError::NoRecords { backend })?;
        read_json(&path)
    }

    /// Persist an analysis
    ///
    /// # Errors
    /// Any I/O failure creating the directory or writing the file.
    pub fn save_analysis(&self, analysis: &PersistedAnalysis) -> io::Result<PathBuf> {
        let name = format!(
            "{ANALYSIS_PREFIX}{}-{}.json",
            stamp(analysis.generated_at),
            self.next_id()
        );
        self.write_json(&name, analysis)
    }

    fn next_id(&self) -> Ulid {
        // Overflow within one millisecond falls back to a random id
        self.ids.lock().generate().unwrap_or_else(|_| Ulid::new())
    }

    /// Load the most recent analysis
    ///
    /// # Errors
    /// - `AnalysisInputError::NoAnalysis` if none was persisted
    /// - `AnalysisInputError::Malformed` / `Io` if the latest file is unreadable
    pub fn latest_analysis(&self) -> Result<PersistedAnalysis, AnalysisInputError> {
        let path = self
            .latest(ANALYSIS_PREFIX, "json")?
            .ok_or(AnalysisInputError::NoAnalysis)?;
        read_json(&path)
    }

    /// Persist a rendered Markdown report
    ///
    /// # Errors
    /// Any I/O failure creating the directory or writing the file.
    pub fn save_report(&self, markdown: &str) -> io::Result<PathBuf> {
        let path = self
            .dir
            .join(format!("{REPORT_PREFIX}{}.md", stamp(Utc::now())));
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, markdown)?;
        tracing::info!(path = %path.display(), "report written");
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        let bytes = serde_json::to_vec_pretty(value)?;
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), "artifact written");
        Ok(path)
    }

    /// Lexically greatest `<prefix>*.<ext>` file, `None` if there is none
    fn latest(&self, prefix: &str, ext: &str) -> Result<Option<PathBuf>, AnalysisInputError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AnalysisInputError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let suffix = format!(".{ext}");
        let latest = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(prefix) && name.ends_with(&suffix))
            .max();
        Ok(latest.map(|name| self.dir.join(name)))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AnalysisInputError> {
    let bytes = std::fs::read(path).map_err(|source| AnalysisInputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loading artifact");
    serde_json::from_slice(&bytes).map_err(|source| AnalysisInputError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
