use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::percentiles::{average, percentile, rate_x100};

const P50: u64 = 50;
const P95: u64 = 95;
const P99: u64 = 99;

/// Latency summary in whole milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub avg_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
}

impl LatencyStats {
    /// Summarizes already sorted latencies.
    #[must_use]
    pub fn from_sorted(sorted: &[u64]) -> Self {
        Self {
            count: u64::try_from(sorted.len()).unwrap_or(u64::MAX),
            avg_ms: average(sorted),
            p50_ms: percentile(sorted, P50),
            p95_ms: percentile(sorted, P95),
            p99_ms: percentile(sorted, P99),
            min_ms: sorted.first().copied().unwrap_or(0),
            max_ms: sorted.last().copied().unwrap_or(0),
        }
    }

    #[must_use]
    pub fn from_unsorted(mut latencies: Vec<u64>) -> Self {
        latencies.sort_unstable();
        Self::from_sorted(&latencies)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StepKey {
    pub index: usize,
    pub name: String,
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step_{}_{}", self.index, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepMetrics {
    pub key: StepKey,
    pub requests: u64,
    pub failures: u64,
    /// Over successful requests only.
    pub latency: LatencyStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Over successful requests only.
    pub latency: LatencyStats,
    pub steps: Vec<StepMetrics>,
    /// Failure counts keyed by classification, e.g. `CONNECTION_ERROR`.
    pub errors: BTreeMap<String, u64>,
}

impl MetricsSnapshot {
    /// Percentage of successful requests with two implied decimals; 0 when
    /// nothing was sent.
    #[must_use]
    pub fn success_rate_x100(&self) -> u64 {
        rate_x100(self.successful_requests, self.total_requests)
    }

    #[must_use]
    pub fn step(&self, index: usize) -> Option<&StepMetrics> {
        self.steps.iter().find(|step| step.key.index == index)
    }
}
