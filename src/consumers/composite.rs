use std::sync::Arc;

use tracing::warn;

use crate::error::ConsumerError;
use crate::result::StepResult;

use super::ResultConsumer;

/// Fans each result out to every child in order.
#[derive(Default)]
pub struct CompositeConsumer {
    consumers: Vec<Arc<dyn ResultConsumer>>,
}

impl CompositeConsumer {
    #[must_use]
    pub const fn new(consumers: Vec<Arc<dyn ResultConsumer>>) -> Self {
        Self { consumers }
    }

    #[must_use]
    pub fn with(mut self, consumer: Arc<dyn ResultConsumer>) -> Self {
        self.consumers.push(consumer);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }
}

impl ResultConsumer for CompositeConsumer {
    /// Delivers to every child even when one fails, then reports the first
    /// failure.
    fn accept(&self, result: &StepResult) -> Result<(), ConsumerError> {
        let mut first_error = None;
        for consumer in &self.consumers {
            if let Err(err) = consumer.accept(result) {
                warn!("Consumer failed: {}", err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
