use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ConsumerError;
use crate::result::StepResult;

use super::ResultConsumer;

/// Tracks whether every request of a run succeeded.
#[derive(Debug, Default)]
pub struct HealthConsumer {
    total: AtomicU64,
    failed: AtomicU64,
    first_failure: OnceLock<StepResult>,
}

impl HealthConsumer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failed_requests(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.failed_requests() == 0
    }

    #[must_use]
    pub fn first_failure(&self) -> Option<&StepResult> {
        self.first_failure.get()
    }
}

impl ResultConsumer for HealthConsumer {
    fn accept(&self, result: &StepResult) -> Result<(), ConsumerError> {
        self.total.fetch_add(1, Ordering::Relaxed);
        if !result.success() {
            self.failed.fetch_add(1, Ordering::Relaxed);
            if self.first_failure.get().is_none() {
                drop(self.first_failure.set(result.clone()));
            }
        }
        Ok(())
    }
}
