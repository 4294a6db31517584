use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::Orchestrator;
use crate::error::{AppResult, EngineError};
use crate::scenario::Scenario;

use super::check::{HealthReport, finish, start_health_check};

const UNREACHABLE: &str = "unreachable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSettings {
    /// Longest a single check may take before the target counts as down.
    pub timeout: Duration,
    pub log_failures: bool,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            log_failures: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitoredTarget {
    pub id: Uuid,
    pub name: String,
    pub scenario: Scenario,
}

impl MonitoredTarget {
    #[must_use]
    pub fn new(name: &str, scenario: Scenario) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            scenario,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Up,
    Down,
}

impl TargetStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TargetStatus::Up => "UP",
            TargetStatus::Down => "DOWN",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking one target, ready to persist.
#[derive(Debug, Clone)]
pub struct HealthCheckRecord {
    pub id: Uuid,
    pub target_id: Uuid,
    pub target_name: String,
    pub checked_at: DateTime<Utc>,
    pub status: TargetStatus,
    pub error_message: Option<String>,
    /// Missing when the check itself could not finish.
    pub report: Option<HealthReport>,
}

/// Source of the targets a scheduler should check.
#[async_trait]
pub trait TargetRegistry: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the targets cannot be listed.
    async fn list_targets(&self) -> AppResult<Vec<MonitoredTarget>>;
}

/// Fixed list of targets.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    targets: Vec<MonitoredTarget>,
}

impl StaticRegistry {
    #[must_use]
    pub const fn new(targets: Vec<MonitoredTarget>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl TargetRegistry for StaticRegistry {
    async fn list_targets(&self) -> AppResult<Vec<MonitoredTarget>> {
        Ok(self.targets.clone())
    }
}

/// Checks one target within `settings.timeout`. A timeout or an execution
/// error marks the target down.
pub async fn check_target(
    orchestrator: &Orchestrator,
    target: &MonitoredTarget,
    settings: &HealthSettings,
) -> HealthCheckRecord {
    let checked_at = Utc::now();
    let outcome = bounded_check(orchestrator, target, settings).await;
    let (status, error_message, report) = match outcome {
        Ok(report) => {
            let status = if report.healthy {
                TargetStatus::Up
            } else {
                TargetStatus::Down
            };
            debug!("Target '{}' ({}) is {}.", target.name, target.id, status);
            (status, report.error_message(), Some(report))
        }
        Err(err) => {
            warn!(
                "Health check failed for target '{}' ({}): {}",
                target.name, target.id, err
            );
            (
                TargetStatus::Down,
                Some(format!("{}: {}", UNREACHABLE, err)),
                None,
            )
        }
    };
    HealthCheckRecord {
        id: Uuid::new_v4(),
        target_id: target.id,
        target_name: target.name.clone(),
        checked_at,
        status,
        error_message,
        report,
    }
}

async fn bounded_check(
    orchestrator: &Orchestrator,
    target: &MonitoredTarget,
    settings: &HealthSettings,
) -> AppResult<HealthReport> {
    let (handle, health) =
        start_health_check(orchestrator, &target.scenario, settings.log_failures)?;
    let canceller = handle.canceller();
    match tokio::time::timeout(
        settings.timeout,
        finish(handle, &health, &target.scenario),
    )
    .await
    {
        Ok(report) => report,
        Err(_elapsed) => {
            canceller.cancel();
            Err(EngineError::HealthCheckTimedOut {
                timeout_ms: settings.timeout.as_millis(),
            }
            .into())
        }
    }
}

/// Checks every registered target concurrently.
///
/// # Errors
///
/// Returns an error when the registry cannot list its targets.
pub async fn check_all_targets(
    orchestrator: &Orchestrator,
    registry: &dyn TargetRegistry,
    settings: &HealthSettings,
) -> AppResult<Vec<HealthCheckRecord>> {
    let targets = registry.list_targets().await?;
    info!("Starting health checks for {} target(s).", targets.len());
    let records = join_all(
        targets
            .iter()
            .map(|target| check_target(orchestrator, target, settings)),
    )
    .await;
    info!("Finished health checks for {} target(s).", records.len());
    Ok(records)
}
