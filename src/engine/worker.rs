use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::consumers::ResultConsumer;
use crate::error::AppResult;
use crate::scenario::{RunMode, Scenario};
use crate::shutdown::{ShutdownReceiver, is_shutdown, wait_for_shutdown};
use crate::workload::{StepExecutor, StepPosition, VariableContext};

pub(super) struct WorkerContext {
    pub(super) worker_id: usize,
    pub(super) scenario: Arc<Scenario>,
    pub(super) executor: StepExecutor,
    pub(super) consumer: Arc<dyn ResultConsumer>,
    pub(super) shutdown_rx: ShutdownReceiver,
    pub(super) wait_in_flight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WorkerExit {
    Completed,
    Cancelled,
}

/// Runs the step sequence for one virtual user until its run mode is
/// exhausted or shutdown fires.
pub(super) async fn run_worker(worker: WorkerContext) -> AppResult<WorkerExit> {
    let WorkerContext {
        worker_id,
        scenario,
        executor,
        consumer,
        mut shutdown_rx,
        wait_in_flight,
    } = worker;

    let started = Instant::now();
    let deadline = match scenario.run_mode() {
        RunMode::Iterations(_) => None,
        RunMode::Duration(duration) => started.checked_add(duration),
    };
    let mut context = VariableContext::new();
    let mut iteration: u64 = 0;

    loop {
        let exhausted = match scenario.run_mode() {
            RunMode::Iterations(runs) => iteration >= runs.get(),
            RunMode::Duration(_) => deadline.is_some_and(|deadline| Instant::now() >= deadline),
        };
        if exhausted {
            debug!("Worker {} finished after {} iteration(s).", worker_id, iteration);
            return Ok(WorkerExit::Completed);
        }

        for (step_index, step) in scenario.steps().iter().enumerate() {
            if is_shutdown(&shutdown_rx) {
                return Ok(WorkerExit::Cancelled);
            }
            let position = StepPosition {
                worker_id,
                iteration,
                step_index,
            };

            let result = if wait_in_flight {
                executor.execute(step, position, &mut context).await?
            } else {
                tokio::select! {
                    biased;
                    () = wait_for_shutdown(&mut shutdown_rx) => {
                        return Ok(WorkerExit::Cancelled);
                    }
                    result = executor.execute(step, position, &mut context) => result?,
                }
            };

            if let Err(err) = consumer.accept(&result) {
                warn!(
                    "Worker {} could not deliver step '{}': {}",
                    worker_id, result.step_name, err
                );
            }
        }

        iteration = iteration.saturating_add(1);
    }
}
