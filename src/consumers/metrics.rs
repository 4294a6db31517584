use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::ConsumerError;
use crate::metrics::{LatencyStats, MetricsSnapshot, StepKey, StepMetrics};
use crate::result::StepResult;

use super::ResultConsumer;

#[derive(Debug, Default)]
struct StepBook {
    requests: u64,
    failures: u64,
    latencies: Vec<u64>,
}

#[derive(Debug, Default)]
struct LatencyBook {
    successful: Vec<u64>,
    steps: BTreeMap<StepKey, StepBook>,
    errors: BTreeMap<&'static str, u64>,
}

/// Online totals plus the latency book needed for percentiles.
#[derive(Debug, Default)]
pub struct MetricsConsumer {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    book: Mutex<LatencyBook>,
}

impl MetricsConsumer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Point-in-time aggregate. Safe to call while results keep arriving.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        let latency = LatencyStats::from_unsorted(book.successful.clone());
        let steps = book
            .steps
            .iter()
            .map(|(key, step)| StepMetrics {
                key: key.clone(),
                requests: step.requests,
                failures: step.failures,
                latency: LatencyStats::from_unsorted(step.latencies.clone()),
            })
            .collect();
        let errors = book
            .errors
            .iter()
            .map(|(kind, count)| ((*kind).to_owned(), *count))
            .collect();
        drop(book);

        MetricsSnapshot {
            total_requests: self.total.load(Ordering::Relaxed),
            successful_requests: self.successful.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            latency,
            steps,
            errors,
        }
    }
}

impl ResultConsumer for MetricsConsumer {
    fn accept(&self, result: &StepResult) -> Result<(), ConsumerError> {
        let key = StepKey {
            index: result.step_index,
            name: result.step_name.clone(),
        };
        let mut book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        self.total.fetch_add(1, Ordering::Relaxed);
        let step = book.steps.entry(key).or_default();
        step.requests = step.requests.saturating_add(1);

        match result.failure() {
            None => {
                let latency = result.latency_ms();
                step.latencies.push(latency);
                book.successful.push(latency);
                self.successful.fetch_add(1, Ordering::Relaxed);
            }
            Some(failure) => {
                step.failures = step.failures.saturating_add(1);
                let count = book.errors.entry(failure.kind.as_str()).or_insert(0);
                *count = count.saturating_add(1);
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}
