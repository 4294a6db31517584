//! Streaming result consumers. Every consumer sees each [`StepResult`] once,
//! possibly from many workers at the same time.
use std::sync::Arc;

use crate::error::ConsumerError;
use crate::result::StepResult;

mod composite;
mod debug;
mod health;
mod metrics;
mod progress;
mod storage;


pub use composite::CompositeConsumer;
pub use debug::{DebugConsumer, DebugOptions};
pub use health::HealthConsumer;
pub use metrics::MetricsConsumer;
pub use progress::{ProgressCallback, ProgressConsumer, ProgressUpdate};
pub use storage::StorageConsumer;

pub trait ResultConsumer: Send + Sync {
    /// Records one result. Must be safe under concurrent calls.
    ///
    /// # Errors
    ///
    /// Returns an error when the consumer could not record the result. The
    /// engine logs it and keeps going.
    fn accept(&self, result: &StepResult) -> Result<(), ConsumerError>;
}

impl<T> ResultConsumer for Arc<T>
where
    T: ResultConsumer + ?Sized,
{
    fn accept(&self, result: &StepResult) -> Result<(), ConsumerError> {
        self.as_ref().accept(result)
    }
}
