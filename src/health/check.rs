use std::num::{NonZeroU64, NonZeroUsize};
use std::sync::Arc;

use tracing::{error, info};

use crate::consumers::{
    CompositeConsumer, DebugConsumer, DebugOptions, HealthConsumer, ResultConsumer,
};
use crate::engine::{Orchestrator, RunHandle};
use crate::error::{AppResult, EngineError};
use crate::result::StepResult;
use crate::scenario::{RunMode, Scenario};

/// Verdict of one health-check run.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub healthy: bool,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub first_failure: Option<StepResult>,
}

impl HealthReport {
    pub(super) fn from_consumer(consumer: &HealthConsumer) -> Self {
        Self {
            healthy: consumer.is_healthy(),
            total_requests: consumer.total_requests(),
            failed_requests: consumer.failed_requests(),
            first_failure: consumer.first_failure().cloned(),
        }
    }

    /// Message of the first failed request, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.first_failure
            .as_ref()
            .and_then(StepResult::failure)
            .map(|failure| failure.message.clone())
    }
}

/// Same name and steps, forced to one iteration with one virtual user.
#[must_use]
pub fn health_check_scenario(scenario: &Scenario) -> Scenario {
    Scenario {
        name: scenario.name.clone(),
        steps: scenario.steps.clone(),
        run_mode: RunMode::Iterations(NonZeroU64::MIN),
        virtual_users: NonZeroUsize::MIN,
    }
}

/// Runs the health-check form of `scenario` and reports the verdict.
///
/// # Errors
///
/// Returns an error when the run cannot be executed, when its worker stops
/// on an error before finishing the pass, or when the run is cancelled.
pub async fn run_health_check(
    orchestrator: &Orchestrator,
    scenario: &Scenario,
) -> AppResult<HealthReport> {
    let (handle, health) = start_health_check(orchestrator, scenario, false)?;
    finish(handle, &health, scenario).await
}

/// Like [`run_health_check`], also logging every failed request.
///
/// # Errors
///
/// Returns the same errors as [`run_health_check`].
pub async fn run_health_check_logged(
    orchestrator: &Orchestrator,
    scenario: &Scenario,
) -> AppResult<HealthReport> {
    let (handle, health) = start_health_check(orchestrator, scenario, true)?;
    let report = finish(handle, &health, scenario).await?;
    if !report.healthy {
        error!(
            "Health check '{}' failed: {}",
            scenario.name(),
            report.error_message().unwrap_or_default()
        );
    }
    Ok(report)
}

pub(super) fn start_health_check(
    orchestrator: &Orchestrator,
    scenario: &Scenario,
    log_failures: bool,
) -> AppResult<(RunHandle, Arc<HealthConsumer>)> {
    let health = Arc::new(HealthConsumer::new());
    let consumer: Arc<dyn ResultConsumer> = if log_failures {
        let debug = DebugConsumer::new(DebugOptions {
            log_successful: false,
            log_request_body: true,
            log_response_body: true,
        });
        let children: Vec<Arc<dyn ResultConsumer>> = vec![health.clone(), Arc::new(debug)];
        Arc::new(CompositeConsumer::new(children))
    } else {
        health.clone()
    };
    info!("Starting health check '{}'.", scenario.name());
    let handle = orchestrator.run_cancellable(&health_check_scenario(scenario), consumer)?;
    Ok((handle, health))
}

pub(super) async fn finish(
    handle: RunHandle,
    health: &HealthConsumer,
    scenario: &Scenario,
) -> AppResult<HealthReport> {
    let run = handle.wait().await?;
    if run.failed_workers > 0 {
        return Err(EngineError::WorkersFailed {
            failures: run.failures,
        }
        .into());
    }
    if run.cancelled {
        return Err(EngineError::HealthCheckCancelled.into());
    }
    let report = HealthReport::from_consumer(health);
    info!(
        "Health check '{}' completed: healthy={}.",
        scenario.name(),
        report.healthy
    );
    Ok(report)
}
