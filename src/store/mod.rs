//! Durable storage of run summaries and health-check verdicts.
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::AppResult;
use crate::health::HealthCheckRecord;

mod record;
mod sqlite;

#[cfg(test)]
mod tests;

pub use record::LoadTestRecord;
pub use sqlite::SqliteResultStore;

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the record cannot be written.
    async fn persist_load_test(&self, record: &LoadTestRecord) -> AppResult<()>;

    /// # Errors
    ///
    /// Returns an error when the record cannot be written.
    async fn persist_health_check(&self, record: &HealthCheckRecord) -> AppResult<()>;
}

/// Writes the record in the background. A failed write is logged and never
/// reaches the caller.
pub fn persist_detached(store: Arc<dyn ResultStore>, record: LoadTestRecord) -> JoinHandle<()> {
    tokio::spawn(async move {
        match store.persist_load_test(&record).await {
            Ok(()) => debug!("Stored load test result {}.", record.id),
            Err(err) => error!("Failed to store load test result {}: {}", record.id, err),
        }
    })
}
