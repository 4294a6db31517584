use std::sync::{Mutex, PoisonError};

use crate::error::ConsumerError;
use crate::result::StepResult;

use super::ResultConsumer;

/// Keeps raw results up to a cap; anything past the cap is dropped.
#[derive(Debug)]
pub struct StorageConsumer {
    max_results: usize,
    failures_only: bool,
    results: Mutex<Vec<StepResult>>,
}

impl StorageConsumer {
    #[must_use]
    pub const fn new(max_results: usize, failures_only: bool) -> Self {
        Self {
            max_results,
            failures_only,
            results: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the stored results in arrival order.
    #[must_use]
    pub fn results(&self) -> Vec<StepResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ResultConsumer for StorageConsumer {
    fn accept(&self, result: &StepResult) -> Result<(), ConsumerError> {
        if self.failures_only && result.success() {
            return Ok(());
        }
        let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        if results.len() < self.max_results {
            results.push(result.clone());
        }
        Ok(())
    }
}
