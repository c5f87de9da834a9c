//! Probe Runner
//!
//! Executes scenarios against one injected backend adapter:
//! - Optional seed write, then the scenario's operation
//! - Consistency wait, then a read of every resolver candidate
//! - Base-path snapshot for diagnostics
//!
//! Adapter failures are caught and recorded on the [`ProbeRecord`]; nothing
//! a single scenario does can abort the rest of the corpus.

use crate::adapter::BackendAdapter;
use crate::cancel::CancelSignal;
use crate::collector::ResultsCollector;
use crate::error::AdapterError;
use crate::run::ProbeRun;
use crate::wait::ConsistencyWait;
use chrono::Utc;
use indexmap::IndexMap;
use pathparity_core::{BackendId, Corpus, Observation, ProbeRecord, Scenario, ScenarioKind};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default throttle between consecutive scenarios
pub const DEFAULT_SCENARIO_DELAY: Duration = Duration::from_millis(200);

/// Runs scenarios sequentially against one backend
#[derive(Clone)]
pub struct ProbeRunner {
    /// Backend this runner speaks for
    backend: BackendId,
    /// Injected adapter
    adapter: Arc<dyn BackendAdapter>,
    /// Wait between write and verification
    wait: ConsistencyWait,
    /// Throttle between scenarios
    scenario_delay: Duration,
}

impl std::fmt::Debug for ProbeRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRunner")
            .field("backend", &self.backend)
            .field("adapter", &self.adapter.name())
            .field("wait", &self.wait)
            .field("scenario_delay", &self.scenario_delay)
            .finish()
    }
}

impl ProbeRunner {
    /// Create a runner with the default wait policy and throttle
    #[inline]
    #[must_use]
    pub fn new(backend: BackendId, adapter: Arc<dyn BackendAdapter>) -> Self {
        Self {
            backend,
            adapter,
            wait: ConsistencyWait::default(),
            scenario_delay: DEFAULT_SCENARIO_DELAY,
        }
    }

    /// Set the consistency wait policy
    #[inline]
    #[must_use]
    pub fn with_wait(mut self, wait: ConsistencyWait) -> Self {
        self.wait = wait;
        self
    }

    /// Set the inter-scenario throttle
    #[inline]
    #[must_use]
    pub fn with_scenario_delay(mut self, delay: Duration) -> Self {
        self.scenario_delay = delay;
        self
    }

    /// Backend this runner speaks for
    #[inline]
    #[must_use]
    pub fn backend(&self) -> BackendId {
        self.backend
    }

    /// The injected adapter
    #[inline]
    #[must_use]
    pub fn adapter(&self) -> &Arc<dyn BackendAdapter> {
        &self.adapter
    }

    /// Run one scenario and record what the backend did
    pub async fn run_probe(&self, scenario: &Scenario) -> ProbeRecord {
        let started = Instant::now();
        let probes = scenario.probe_targets();
        tracing::info!(scenario = %scenario.name, backend = %self.backend, "probing");

        let mut record = ProbeRecord {
            scenario_name: scenario.name.clone(),
            backend: self.backend,
            path_used: scenario.base_path.clone(),
            operation: scenario.operation(),
            write_succeeded: false,
            write_error: None,
            error_kind: None,
            probes,
            verification: IndexMap::new(),
            base_value: None,
            duration_ms: 0,
            recorded_at: Utc::now(),
        };

        match self.execute(scenario).await {
            Ok(()) => {
                record.write_succeeded = true;
                self.verify(scenario, &mut record).await;
            }
            Err(err) => {
                tracing::warn!(
                    scenario = %scenario.name,
                    backend = %self.backend,
                    error = %err,
                    "write failed"
                );
                record.error_kind = Some(err.kind);
                record.write_error = Some(err.to_string());
            }
        }

        record.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        record.recorded_at = Utc::now();
        tracing::info!(
            scenario = %scenario.name,
            backend = %self.backend,
            succeeded = record.write_succeeded,
            found = record.found_count(),
            "probe finished"
        );
        record
    }

    /// Run every scenario in corpus order until done or cancelled
    pub async fn run_corpus(&self, corpus: &Corpus, cancel: CancelSignal) -> ProbeRun {
        let collector = ResultsCollector::new();
        let started_at = Utc::now();
        let cancelled = self.run_into(corpus, cancel, &collector).await;
        let run = ProbeRun::new(
            self.backend,
            self.adapter.name(),
            started_at,
            cancelled,
            collector.into_records(),
        );
        tracing::info!(
            backend = %self.backend,
            total = run.summary.total,
            successful = run.summary.successful,
            cancelled,
            "probe run finished"
        );
        run
    }

    /// Run the corpus, appending records to `collector`
    ///
    /// Returns whether the run was cancelled. Records completed before the
    /// cancellation stay in the collector; the interrupted scenario is dropped.
    pub async fn run_into(
        &self,
        corpus: &Corpus,
        mut cancel: CancelSignal,
        collector: &ResultsCollector,
    ) -> bool {
        tracing::info!(
            backend = %self.backend,
            adapter = self.adapter.name(),
            scenarios = corpus.len(),
            "starting probe run"
        );

        for (index, scenario) in corpus.scenarios().iter().enumerate() {
            if cancel.is_cancelled() {
                return true;
            }

            if index > 0 && !self.scenario_delay.is_zero() {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return true,
                    () = tokio::time::sleep(self.scenario_delay) => {}
                }
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::warn!(scenario = %scenario.name, backend = %self.backend, "probe interrupted");
                    return true;
                }
                record = self.run_probe(scenario) => collector.push(record),
            }
        }
        false
    }

    async fn execute(&self, scenario: &Scenario) -> Result<(), AdapterError> {
        let adapter = self.adapter.as_ref();
        let base = scenario.base_path.as_str();

        if let Some(seed) = &scenario.seed {
            tracing::debug!(scenario = %scenario.name, path = base, "seeding base path");
            adapter
                .write(base, seed)
                .await
                .map_err(|e| e.context("seed write failed"))?;
        }

        tracing::debug!(
            scenario = %scenario.name,
            operation = %scenario.operation(),
            path = base,
            "issuing write"
        );
        match &scenario.kind {
            ScenarioKind::Write { value } => adapter.write(base, value).await,
            ScenarioKind::PartialUpdate { updates } => adapter.partial_update(base, updates).await,
            ScenarioKind::BatchUpdate { updates } => adapter.batch_update(base, updates).await,
        }
    }

    async fn verify(&self, scenario: &Scenario, record: &mut ProbeRecord) {
        let adapter = self.adapter.as_ref();

        let primaries = record.primary_paths();
        let outcome = self.wait.settle(adapter, &primaries).await;
        tracing::debug!(scenario = %scenario.name, ?outcome, "consistency wait done");

        for probe in &record.probes {
            for candidate in &probe.candidates {
                if record.verification.contains_key(candidate) {
                    continue;
                }
                let observation = match adapter.read(candidate).await {
                    Ok(read) if read.found => Observation::found(read.value),
                    Ok(_) => Observation::missing(),
                    Err(err) => {
                        tracing::debug!(path = %candidate, error = %err, "candidate read failed");
                        Observation::failed(err.to_string())
                    }
                };
                tracing::debug!(path = %candidate, found = observation.found, "candidate read");
                record.verification.insert(candidate.clone(), observation);
            }
        }

        record.base_value = match adapter.read(&scenario.base_path).await {
            Ok(read) if read.found => Some(read.value),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(path = %scenario.base_path, error = %err, "base snapshot failed");
                None
            }
        };
    }
}
