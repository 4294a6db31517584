//! Ready-made consumer stacks around the orchestrator.
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::consumers::{
    CompositeConsumer, DebugConsumer, DebugOptions, MetricsConsumer, ProgressCallback,
    ProgressConsumer, ResultConsumer, StorageConsumer,
};
use crate::engine::{Orchestrator, RunCanceller, RunHandle, RunReport};
use crate::error::AppResult;
use crate::metrics::MetricsSnapshot;
use crate::result::StepResult;
use crate::scenario::Scenario;
use crate::store::{LoadTestRecord, ResultStore, persist_detached};


/// What a finished load test produced.
#[derive(Debug, Clone)]
pub struct LoadTestOutcome {
    pub scenario_name: String,
    pub started_at: DateTime<Utc>,
    pub report: RunReport,
    pub metrics: MetricsSnapshot,
}

impl LoadTestOutcome {
    /// Summary row for storage, measured over the run's wall-clock time.
    #[must_use]
    pub fn to_record(&self, target_id: Option<Uuid>) -> LoadTestRecord {
        LoadTestRecord::from_snapshot(
            target_id,
            &self.scenario_name,
            &self.metrics,
            self.report.elapsed,
            self.started_at,
        )
    }
}

/// Outcome plus the individual results kept by the storage consumer.
#[derive(Debug, Clone)]
pub struct DetailedOutcome {
    pub outcome: LoadTestOutcome,
    pub results: Vec<StepResult>,
}

/// Outcome plus the pending background write of its record.
#[derive(Debug)]
pub struct PersistedOutcome {
    pub outcome: LoadTestOutcome,
    pub record: LoadTestRecord,
    pub write: JoinHandle<()>,
}

/// A started load test whose metrics are collected as it runs.
pub struct RunningLoadTest {
    scenario_name: String,
    started_at: DateTime<Utc>,
    handle: RunHandle,
    metrics: Arc<MetricsConsumer>,
}

impl RunningLoadTest {
    #[must_use]
    pub fn canceller(&self) -> RunCanceller {
        self.handle.canceller()
    }

    /// Metrics gathered so far; only final once [`Self::finish`] returns.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// # Errors
    ///
    /// Returns an error when the run fails under its completion policy.
    pub async fn finish(self) -> AppResult<LoadTestOutcome> {
        let report = self.handle.wait().await?;
        let metrics = self.metrics.snapshot();
        info!(
            "Load test '{}' finished: {} requests, {} failed, p95 {}ms.",
            self.scenario_name,
            metrics.total_requests,
            metrics.failed_requests,
            metrics.latency.p95_ms
        );
        Ok(LoadTestOutcome {
            scenario_name: self.scenario_name,
            started_at: self.started_at,
            report,
            metrics,
        })
    }
}

#[derive(Clone)]
pub struct LoadTestService {
    orchestrator: Orchestrator,
}

impl LoadTestService {
    #[must_use]
    pub const fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    /// Starts a run that always collects metrics, feeding `extra` consumers
    /// alongside.
    ///
    /// # Errors
    ///
    /// Returns an error when the run cannot be started.
    pub fn start(
        &self,
        scenario: &Scenario,
        extra: Vec<Arc<dyn ResultConsumer>>,
    ) -> AppResult<RunningLoadTest> {
        let metrics = Arc::new(MetricsConsumer::new());
        let base: Vec<Arc<dyn ResultConsumer>> = vec![metrics.clone()];
        let consumer = extra
            .into_iter()
            .fold(CompositeConsumer::new(base), CompositeConsumer::with);
        let started_at = Utc::now();
        let handle = self
            .orchestrator
            .run_cancellable(scenario, Arc::new(consumer))?;
        Ok(RunningLoadTest {
            scenario_name: scenario.name().to_owned(),
            started_at,
            handle,
            metrics,
        })
    }

    /// # Errors
    ///
    /// Returns an error when the run fails under its completion policy.
    pub async fn execute(&self, scenario: &Scenario) -> AppResult<LoadTestOutcome> {
        self.start(scenario, Vec::new())?.finish().await
    }

    /// Reports progress against the scenario's expected result count.
    ///
    /// # Errors
    ///
    /// Returns an error when the run fails under its completion policy.
    pub async fn execute_with_progress(
        &self,
        scenario: &Scenario,
        interval: Duration,
        callback: ProgressCallback,
    ) -> AppResult<LoadTestOutcome> {
        let progress: Arc<dyn ResultConsumer> = Arc::new(ProgressConsumer::new(
            scenario.expected_results(),
            interval,
            callback,
        ));
        self.start(scenario, vec![progress])?
            .finish()
            .await
    }

    /// Keeps up to `max_results` individual results.
    ///
    /// # Errors
    ///
    /// Returns an error when the run fails under its completion policy.
    pub async fn execute_detailed(
        &self,
        scenario: &Scenario,
        max_results: usize,
        failures_only: bool,
    ) -> AppResult<DetailedOutcome> {
        let storage = Arc::new(StorageConsumer::new(max_results, failures_only));
        let extra: Vec<Arc<dyn ResultConsumer>> = vec![storage.clone()];
        let outcome = self.start(scenario, extra)?
            .finish()
            .await?;
        Ok(DetailedOutcome {
            outcome,
            results: storage.results(),
        })
    }

    /// # Errors
    ///
    /// Returns an error when the run fails under its completion policy.
    pub async fn execute_debug(
        &self,
        scenario: &Scenario,
        options: DebugOptions,
    ) -> AppResult<LoadTestOutcome> {
        let debug: Arc<dyn ResultConsumer> = Arc::new(DebugConsumer::new(options));
        self.start(scenario, vec![debug])?
            .finish()
            .await
    }

    /// Runs, then hands the summary to the store in the background. A failed
    /// write is logged and does not fail the run.
    ///
    /// # Errors
    ///
    /// Returns an error when the run fails under its completion policy.
    pub async fn execute_and_persist(
        &self,
        scenario: &Scenario,
        target_id: Option<Uuid>,
        store: Arc<dyn ResultStore>,
    ) -> AppResult<PersistedOutcome> {
        let outcome = self.execute(scenario).await?;
        let record = outcome.to_record(target_id);
        let write = persist_detached(store, record.clone());
        Ok(PersistedOutcome {
            outcome,
            record,
            write,
        })
    }
}
