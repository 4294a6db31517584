use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::metrics::MetricsSnapshot;

/// Hundredths of a request per second, over elapsed microseconds.
const RPS_SCALE: u128 = 100_000_000;

/// Persisted summary of one load test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadTestRecord {
    pub id: Uuid,
    pub target_id: Option<Uuid>,
    pub scenario_name: String,
    pub executed_at: DateTime<Utc>,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_ms: u64,
    pub median_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
    /// Throughput with two implied decimals; `250` is 2.50 requests/s.
    pub requests_per_second_x100: u64,
}

impl LoadTestRecord {
    /// Summarizes a snapshot. Throughput is measured over `elapsed` and is
    /// 0 when no time passed.
    #[must_use]
    pub fn from_snapshot(
        target_id: Option<Uuid>,
        scenario_name: &str,
        snapshot: &MetricsSnapshot,
        elapsed: Duration,
        executed_at: DateTime<Utc>,
    ) -> Self {
        let requests_per_second_x100 = u128::from(snapshot.total_requests)
            .saturating_mul(RPS_SCALE)
            .checked_div(elapsed.as_micros())
            .map_or(0, |rps| u64::try_from(rps).unwrap_or(u64::MAX));
        Self {
            id: Uuid::new_v4(),
            target_id,
            scenario_name: scenario_name.to_owned(),
            executed_at,
            total_requests: snapshot.total_requests,
            successful_requests: snapshot.successful_requests,
            failed_requests: snapshot.failed_requests,
            avg_ms: snapshot.latency.avg_ms,
            median_ms: snapshot.latency.p50_ms,
            p95_ms: snapshot.latency.p95_ms,
            p99_ms: snapshot.latency.p99_ms,
            min_ms: snapshot.latency.min_ms,
            max_ms: snapshot.latency.max_ms,
            requests_per_second_x100,
        }
    }
}
