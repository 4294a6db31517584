use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::ConsumerError;
use crate::metrics::rate_x100;
use crate::result::StepResult;

use super::ResultConsumer;

const NEVER_FIRED: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub completed: u64,
    pub expected: u64,
}

impl ProgressUpdate {
    /// Percent of the expected total with two implied decimals; may pass
    /// `10_000` in duration mode.
    #[must_use]
    pub fn percent_x100(&self) -> u64 {
        rate_x100(self.completed, self.expected)
    }
}

pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) -> Result<(), ConsumerError> + Send + Sync>;

/// Counts results and reports progress at most once per interval.
pub struct ProgressConsumer {
    expected: u64,
    interval_ms: u64,
    started: Instant,
    completed: AtomicU64,
    last_fired_ms: AtomicU64,
    callback: ProgressCallback,
}

impl fmt::Debug for ProgressConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressConsumer")
            .field("expected", &self.expected)
            .field("interval_ms", &self.interval_ms)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl ProgressConsumer {
    #[must_use]
    pub fn new(expected: u64, interval: Duration, callback: ProgressCallback) -> Self {
        Self {
            expected,
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            started: Instant::now(),
            completed: AtomicU64::new(0),
            last_fired_ms: AtomicU64::new(NEVER_FIRED),
            callback,
        }
    }

    #[must_use]
    pub fn progress(&self) -> ProgressUpdate {
        ProgressUpdate {
            completed: self.completed.load(Ordering::Relaxed),
            expected: self.expected,
        }
    }

    /// Claims the right to fire for this interval; only one caller wins.
    fn claim_fire(&self) -> bool {
        let now_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX - 1);
        let last = self.last_fired_ms.load(Ordering::Acquire);
        let due = last == NEVER_FIRED || now_ms.saturating_sub(last) >= self.interval_ms;
        due && self
            .last_fired_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl ResultConsumer for ProgressConsumer {
    fn accept(&self, _result: &StepResult) -> Result<(), ConsumerError> {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        if !self.claim_fire() {
            return Ok(());
        }
        (self.callback)(ProgressUpdate {
            completed,
            expected: self.expected,
        })
    }
}
