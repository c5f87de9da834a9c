//! Subcommand implementations
//!
//! [`App`] owns the resolved settings, the result store and one adapter per
//! backend. Every subcommand is a method returning data; `main` only prints.

use crate::config::Settings;
use anyhow::Context;
use pathparity_core::{
    aggregate, fixture_tree, pair_and_compare, resolve_candidates, BackendId, Corpus, Operation,
    PathPattern, FIXTURE_PATH,
};
use pathparity_probe::{BackendAdapter, CancelHandle, ProbeRun, ProbeRunner};
use pathparity_report::{render_markdown, PersistedAnalysis, ResultStore};
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Outcome of a cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Top-level segments deleted
    pub deleted: Vec<String>,
    /// Segments whose delete failed, with the error
    pub failed: Vec<(String, String)>,
}

/// Paths written by `report`
#[derive(Debug, Clone)]
pub struct ReportOutput {
    /// Markdown file
    pub path: PathBuf,
    /// The analysis it was rendered from
    pub analysis: PersistedAnalysis,
}

/// Wiring for one invocation
pub struct App {
    settings: Settings,
    store: ResultStore,
    adapter_a: Arc<dyn BackendAdapter>,
    adapter_b: Arc<dyn BackendAdapter>,
    cancel: CancelHandle,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("settings", &self.settings)
            .field("adapter_a", &self.adapter_a.name())
            .field("adapter_b", &self.adapter_b.name())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build both adapters from `settings`
    ///
    /// # Errors
    /// If either adapter cannot be constructed.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let adapter_a = settings
            .backend(BackendId::A)
            .build()
            .context("building backend A")?;
        let adapter_b = settings
            .backend(BackendId::B)
            .build()
            .context("building backend B")?;
        Ok(Self::with_adapters(settings, adapter_a, adapter_b))
    }

    /// Use pre-built adapters
    #[must_use]
    pub fn with_adapters(
        settings: Settings,
        adapter_a: Arc<dyn BackendAdapter>,
        adapter_b: Arc<dyn BackendAdapter>,
    ) -> Self {
        let store = ResultStore::new(settings.results_dir.clone());
        let (cancel, _) = CancelHandle::new();
        Self {
            settings,
            store,
            adapter_a,
            adapter_b,
            cancel,
        }
    }

    /// Handle that interrupts every run started by this app
    #[inline]
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Result store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    fn adapter(&self, backend: BackendId) -> Arc<dyn BackendAdapter> {
        match backend {
            BackendId::A => Arc::clone(&self.adapter_a),
            BackendId::B => Arc::clone(&self.adapter_b),
        }
    }

    /// Runner for `backend` configured from settings
    #[must_use]
    pub fn runner(&self, backend: BackendId) -> ProbeRunner {
        ProbeRunner::new(backend, self.adapter(backend))
            .with_wait(self.settings.wait)
            .with_scenario_delay(self.settings.scenario_delay())
    }

    /// Probe one backend and persist the run
    ///
    /// # Errors
    /// If the run cannot be written to the result store.
    pub async fn run_backend(&self, backend: BackendId, corpus: &Corpus) -> anyhow::Result<ProbeRun> {
        let run = self.runner(backend).run_corpus(corpus, self.cancel.signal()).await;
        self.store
            .save_run(&run)
            .with_context(|| format!("saving run for backend {backend}"))?;
        Ok(run)
    }

    /// Whether both backends read and write the same data
    ///
    /// True for one adapter injected twice, or two adapters naming the same
    /// store address.
    #[must_use]
    pub fn shares_store(&self) -> bool {
        let same_adapter =
            Arc::as_ptr(&self.adapter_a).cast::<()>() == Arc::as_ptr(&self.adapter_b).cast::<()>();
        same_adapter
            || matches!(
                (self.adapter_a.store_key(), self.adapter_b.store_key()),
                (Some(a), Some(b)) if a == b
            )
    }

    /// Probe both backends, then analyze
    ///
    /// Backends on separate stores run concurrently. On a shared store A runs
    /// to completion before B starts, so neither reads the other's writes
    /// mid-scenario. Both runs are persisted before the analysis is attempted.
    ///
    /// # Errors
    /// Persistence failures or a corpus integrity error.
    pub async fn run_both(&self, corpus: &Corpus) -> anyhow::Result<PersistedAnalysis> {
        let (a, b) = if self.shares_store() {
            tracing::info!("backends share a store, running sequentially");
            let a = self.run_backend(BackendId::A, corpus).await?;
            let b = self.run_backend(BackendId::B, corpus).await?;
            (a, b)
        } else {
            let (a, b) = tokio::join!(
                self.run_backend(BackendId::A, corpus),
                self.run_backend(BackendId::B, corpus)
            );
            (a?, b?)
        };
        self.analyze_runs(corpus, &a, &b, &[])
    }

    /// Analyze the latest persisted run of each backend
    ///
    /// Records are paired against the whole `corpus`; `only` then restricts
    /// the report to those operations (empty keeps everything).
    ///
    /// # Errors
    /// - [`pathparity_report::AnalysisInputError`] if a run is missing or unreadable
    /// - A corpus integrity error or persistence failure
    pub fn analyze_latest(
        &self,
        corpus: &Corpus,
        only: &[Operation],
    ) -> anyhow::Result<PersistedAnalysis> {
        let a = self.store.latest_run(BackendId::A)?;
        let b = self.store.latest_run(BackendId::B)?;
        self.analyze_runs(corpus, &a, &b, only)
    }

    fn analyze_runs(
        &self,
        corpus: &Corpus,
        a: &ProbeRun,
        b: &ProbeRun,
        only: &[Operation],
    ) -> anyhow::Result<PersistedAnalysis> {
        let mut comparisons = pair_and_compare(corpus, &a.records, &b.records)?;
        if !only.is_empty() {
            comparisons.retain(|c| only.contains(&c.operation));
        }
        let report = aggregate(comparisons);
        tracing::info!(
            total = report.summary.total,
            identical = report.summary.identical,
            different = report.summary.different,
            critical = report.summary.critical_scenario_names.len(),
            "analysis complete"
        );
        if let Err(violation) = report.check_invariants() {
            tracing::error!(%violation, "analysis report is inconsistent");
        }
        let analysis = PersistedAnalysis::new(report, &[a, b]);
        self.store
            .save_analysis(&analysis)
            .context("saving analysis")?;
        Ok(analysis)
    }

    /// Render the latest analysis to Markdown and persist it
    ///
    /// # Errors
    /// - [`pathparity_report::AnalysisInputError`] if there is no analysis
    /// - Persistence failure
    pub fn report_latest(&self) -> anyhow::Result<ReportOutput> {
        let analysis = self.store.latest_analysis()?;
        let markdown = render_markdown(&analysis);
        let path = self.store.save_report(&markdown).context("saving report")?;
        Ok(ReportOutput { path, analysis })
    }

    /// Delete every top-level segment the corpus may have written
    ///
    /// Individual delete failures are collected, not propagated.
    pub async fn cleanup(&self, backend: BackendId, corpus: &Corpus) -> CleanupSummary {
        let adapter = self.adapter(backend);
        let mut summary = CleanupSummary::default();
        for root in corpus.touched_roots() {
            let path = format!("/{root}");
            match adapter.delete(&path).await {
                Ok(()) => {
                    tracing::debug!(backend = %backend, path = %path, "deleted");
                    summary.deleted.push(root);
                }
                Err(e) => {
                    tracing::warn!(backend = %backend, path = %path, error = %e, "delete failed");
                    summary.failed.push((root, e.to_string()));
                }
            }
        }
        summary
    }

    /// Clear the corpus roots, then write the fixture tree at [`FIXTURE_PATH`]
    ///
    /// # Errors
    /// If the fixture write fails. Delete failures are reported in the summary.
    pub async fn setup(&self, backend: BackendId, corpus: &Corpus) -> anyhow::Result<CleanupSummary> {
        let cleared = self.cleanup(backend, corpus).await;
        self.adapter(backend)
            .write(FIXTURE_PATH, &fixture_tree())
            .await
            .with_context(|| format!("writing fixture tree to backend {backend}"))?;
        tracing::info!(backend = %backend, path = FIXTURE_PATH, "fixture tree written");
        Ok(cleared)
    }
}

/// One line per scenario: operation, base-path pattern, name
#[must_use]
pub fn corpus_listing(corpus: &Corpus) -> String {
    let mut out = String::new();
    for scenario in corpus.scenarios() {
        let _ = writeln!(
            out,
            "{:<14} {:<28} {}",
            scenario.operation().as_str(),
            scenario.pattern().label(),
            scenario.name
        );
    }
    let _ = writeln!(out, "{} scenarios", corpus.len());
    out
}

/// Candidate locations for a base path and update key
#[must_use]
pub fn resolve_listing(base_path: &str, update_key: &str) -> String {
    let [primary, alternate] = resolve_candidates(base_path, update_key);
    format!(
        "base pattern: {}\nprimary:   {primary}\nalternate: {alternate}\n",
        PathPattern::classify(base_path).label()
    )
}
