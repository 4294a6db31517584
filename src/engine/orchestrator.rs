use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info};

use crate::consumers::ResultConsumer;
use crate::error::{AppError, AppResult, EngineError, WorkerFailure};
use crate::http::Invoker;
use crate::scenario::Scenario;
use crate::shutdown::{
    ShutdownReceiver, ShutdownSender, is_shutdown, shutdown_channel, trigger_shutdown,
};
use crate::workload::StepExecutor;

use super::settings::{CompletionPolicy, ConcurrencyStrategy, EngineSettings};
use super::worker::{WorkerContext, WorkerExit, run_worker};

const RUN_THREAD_NAME: &str = "loadprobe-run";

/// How a run ended.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub workers: usize,
    pub completed_workers: usize,
    pub failed_workers: usize,
    /// Shutdown fired before every worker finished on its own.
    pub cancelled: bool,
    pub elapsed: Duration,
    pub failures: Vec<WorkerFailure>,
}

/// Drives scenarios through a shared invoker.
#[derive(Clone)]
pub struct Orchestrator {
    executor: StepExecutor,
    settings: EngineSettings,
}

impl Orchestrator {
    #[must_use]
    pub const fn new(invoker: Arc<dyn Invoker>, settings: EngineSettings) -> Self {
        Self {
            executor: StepExecutor::new(invoker),
            settings,
        }
    }

    /// Runs to the end, stopping only failed workers.
    ///
    /// # Errors
    ///
    /// Returns an error when the run cannot be started.
    pub async fn run_to_completion(
        &self,
        scenario: &Scenario,
        consumer: Arc<dyn ResultConsumer>,
    ) -> AppResult<RunReport> {
        self.run(scenario, consumer, CompletionPolicy::BestEffort)
            .await
    }

    /// Runs to the end under an explicit completion policy.
    ///
    /// # Errors
    ///
    /// Returns an error when the run cannot be started, or under
    /// [`CompletionPolicy::FailFast`] when any worker fails.
    pub async fn run(
        &self,
        scenario: &Scenario,
        consumer: Arc<dyn ResultConsumer>,
        policy: CompletionPolicy,
    ) -> AppResult<RunReport> {
        self.start(scenario, consumer, policy)?.wait().await
    }

    /// Starts a run and returns a handle that can cancel or await it. Uses
    /// the configured completion policy.
    ///
    /// # Errors
    ///
    /// Returns an error when the run cannot be started.
    pub fn run_cancellable(
        &self,
        scenario: &Scenario,
        consumer: Arc<dyn ResultConsumer>,
    ) -> AppResult<RunHandle> {
        self.start(scenario, consumer, self.settings.policy)
    }

    fn start(
        &self,
        scenario: &Scenario,
        consumer: Arc<dyn ResultConsumer>,
        policy: CompletionPolicy,
    ) -> AppResult<RunHandle> {
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let finished = Arc::new(AtomicBool::new(false));
        let plan = RunPlan {
            scenario: Arc::new(scenario.clone()),
            executor: self.executor.clone(),
            consumer,
            policy,
            wait_in_flight: self.settings.wait_in_flight,
            shutdown_tx: Arc::clone(&shutdown_tx),
            shutdown_rx,
        };

        let completion = match self.settings.strategy {
            ConcurrencyStrategy::SharedRuntime => {
                let runtime = tokio::runtime::Handle::try_current()
                    .map_err(|_err| AppError::engine(EngineError::NoRuntime))?;
                let finished = Arc::clone(&finished);
                Completion::Task(runtime.spawn(async move {
                    let outcome = drive(plan).await;
                    finished.store(true, Ordering::Release);
                    outcome
                }))
            }
            ConcurrencyStrategy::DedicatedRuntime { worker_threads } => {
                let (outcome_tx, outcome_rx) = oneshot::channel();
                let finished = Arc::clone(&finished);
                std::thread::Builder::new()
                    .name(RUN_THREAD_NAME.to_owned())
                    .spawn(move || {
                        let outcome = match tokio::runtime::Builder::new_multi_thread()
                            .worker_threads(worker_threads.get())
                            .enable_all()
                            .build()
                        {
                            Ok(runtime) => runtime.block_on(drive(plan)),
                            Err(err) => Err(AppError::engine(EngineError::RuntimeBuildFailed {
                                source: err,
                            })),
                        };
                        finished.store(true, Ordering::Release);
                        drop(outcome_tx.send(outcome));
                    })
                    .map_err(|err| AppError::engine(EngineError::SpawnRunThread { source: err }))?;
                Completion::Thread(outcome_rx)
            }
        };

        Ok(RunHandle {
            shutdown_tx,
            finished,
            completion,
        })
    }
}

enum Completion {
    Task(JoinHandle<AppResult<RunReport>>),
    Thread(oneshot::Receiver<AppResult<RunReport>>),
}

/// Cancels a run without owning its handle.
#[derive(Debug, Clone)]
pub struct RunCanceller {
    shutdown_tx: ShutdownSender,
}

impl RunCanceller {
    pub fn cancel(&self) {
        trigger_shutdown(&self.shutdown_tx);
    }
}

/// Handle to a started run.
pub struct RunHandle {
    shutdown_tx: ShutdownSender,
    finished: Arc<AtomicBool>,
    completion: Completion,
}

impl RunHandle {
    /// Asks every worker to stop before its next step. Idempotent.
    pub fn cancel(&self) {
        trigger_shutdown(&self.shutdown_tx);
    }

    #[must_use]
    pub fn canceller(&self) -> RunCanceller {
        RunCanceller {
            shutdown_tx: Arc::clone(&self.shutdown_tx),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.finished.load(Ordering::Acquire)
    }

    /// Waits for every worker to stop.
    ///
    /// # Errors
    ///
    /// Returns an error when the run itself failed or, under fail-fast, when
    /// a worker failed.
    pub async fn wait(self) -> AppResult<RunReport> {
        match self.completion {
            Completion::Task(task) => task
                .await
                .map_err(|err| AppError::engine(EngineError::RunJoinFailed { source: err }))?,
            Completion::Thread(outcome_rx) => outcome_rx
                .await
                .map_err(|_err| AppError::engine(EngineError::RunThreadLost))?,
        }
    }
}

struct RunPlan {
    scenario: Arc<Scenario>,
    executor: StepExecutor,
    consumer: Arc<dyn ResultConsumer>,
    policy: CompletionPolicy,
    wait_in_flight: bool,
    shutdown_tx: ShutdownSender,
    shutdown_rx: ShutdownReceiver,
}

async fn drive(plan: RunPlan) -> AppResult<RunReport> {
    let RunPlan {
        scenario,
        executor,
        consumer,
        policy,
        wait_in_flight,
        shutdown_tx,
        shutdown_rx,
    } = plan;
    let workers = scenario.virtual_users().get();
    info!(
        "Starting scenario '{}': {} virtual user(s), {} step(s), {:?}.",
        scenario.name(),
        workers,
        scenario.steps().len(),
        scenario.run_mode()
    );
    let started = Instant::now();

    let mut pending: FuturesUnordered<_> = (0..workers)
        .map(|worker_id| {
            let handle = tokio::spawn(run_worker(WorkerContext {
                worker_id,
                scenario: Arc::clone(&scenario),
                executor: executor.clone(),
                consumer: Arc::clone(&consumer),
                shutdown_rx: shutdown_rx.clone(),
                wait_in_flight,
            }));
            async move { (worker_id, handle.await) }
        })
        .collect();

    let mut completed_workers: usize = 0;
    let mut failures = Vec::new();
    while let Some((worker_id, joined)) = pending.next().await {
        let message = match joined {
            Ok(Ok(WorkerExit::Completed)) => {
                completed_workers = completed_workers.saturating_add(1);
                continue;
            }
            Ok(Ok(WorkerExit::Cancelled)) => continue,
            Ok(Err(err)) => err.to_string(),
            Err(err) if err.is_panic() => format!("panicked: {}", err),
            Err(err) => err.to_string(),
        };
        error!("Worker {} failed: {}", worker_id, message);
        failures.push(WorkerFailure { worker_id, message });
        if policy == CompletionPolicy::FailFast {
            trigger_shutdown(&shutdown_tx);
        }
    }

    let elapsed = started.elapsed();
    if policy == CompletionPolicy::FailFast && !failures.is_empty() {
        failures.sort_by_key(|failure| failure.worker_id);
        return Err(AppError::engine(EngineError::WorkersFailed { failures }));
    }

    let report = RunReport {
        workers,
        completed_workers,
        failed_workers: failures.len(),
        cancelled: is_shutdown(&shutdown_rx),
        elapsed,
        failures,
    };
    info!(
        "Scenario '{}' finished in {}ms: {} completed, {} failed{}.",
        scenario.name(),
        report.elapsed.as_millis(),
        report.completed_workers,
        report.failed_workers,
        if report.cancelled { ", cancelled" } else { "" }
    );
    Ok(report)
}
