use std::fmt;

use thiserror::Error;

/// One worker that stopped on an unrecovered error.
#[derive(Debug, Clone)]
pub struct WorkerFailure {
    pub worker_id: usize,
    pub message: String,
}

impl fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker {}: {}", self.worker_id, self.message)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{} worker(s) failed; first: {}", .failures.len(), first_failure(.failures))]
    WorkersFailed { failures: Vec<WorkerFailure> },
    #[error("Failed to build run runtime: {source}")]
    RuntimeBuildFailed {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to spawn run thread: {source}")]
    SpawnRunThread {
        #[source]
        source: std::io::Error,
    },
    #[error("The shared runtime strategy needs a running tokio runtime.")]
    NoRuntime,
    #[error("Run thread exited before reporting a result.")]
    RunThreadLost,
    #[error("Run task join error: {source}")]
    RunJoinFailed {
        #[source]
        source: tokio::task::JoinError,
    },
    #[error("Health check did not finish within {timeout_ms}ms.")]
    HealthCheckTimedOut { timeout_ms: u128 },
    #[error("Health check was cancelled before its pass finished.")]
    HealthCheckCancelled,
}

fn first_failure(failures: &[WorkerFailure]) -> String {
    failures
        .first()
        .map_or_else(|| "none".to_owned(), ToString::to_string)
}
