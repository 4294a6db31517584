use std::sync::Arc;

use tracing::{error, info, warn};

use crate::args::{HealthArgs, RunArgs};
use crate::config::EngineConfig;
use crate::consumers::{DebugConsumer, ProgressConsumer, ResultConsumer, StorageConsumer};
use crate::engine::Orchestrator;
use crate::error::AppResult;
use crate::health::{MonitoredTarget, StaticRegistry, TargetStatus, check_all_targets};
use crate::http::{Invoker, ReqwestInvoker};
use crate::scenario::load_scenario;
use crate::service::LoadTestService;
use crate::shutdown::{shutdown_channel, trigger_shutdown};
use crate::store::{ResultStore, SqliteResultStore, persist_detached};

use super::progress::{finish_progress_line, progress_callback, progress_enabled};
use super::signals::setup_signal_canceller;
use super::summary::{failure_lines, health_line, summary_json, summary_lines};

fn orchestrator(config: &EngineConfig) -> AppResult<Orchestrator> {
    let invoker: Arc<dyn Invoker> = Arc::new(ReqwestInvoker::from_settings(&config.http)?);
    Ok(Orchestrator::new(invoker, config.engine))
}

async fn open_store(config: &EngineConfig) -> Option<Arc<SqliteResultStore>> {
    let path = config.sqlite_path.as_ref()?;
    match SqliteResultStore::open(path).await {
        Ok(store) => Some(Arc::new(store)),
        Err(err) => {
            error!("Results will not be stored: {}", err);
            None
        }
    }
}

/// Runs one load test and prints its summary.
pub(crate) async fn run_load_test(
    args: &RunArgs,
    config: &EngineConfig,
    no_color: bool,
) -> AppResult<()> {
    let scenario = load_scenario(&args.scenario)?;
    let service = LoadTestService::new(orchestrator(config)?);

    let mut extra: Vec<Arc<dyn ResultConsumer>> = Vec::new();
    let show_progress = config.progress_interval.is_some() && progress_enabled();
    if let Some(interval) = config.progress_interval
        && show_progress
    {
        extra.push(Arc::new(ProgressConsumer::new(
            scenario.expected_results(),
            interval,
            progress_callback(no_color),
        )));
    }
    let storage = config
        .storage
        .map(|settings| Arc::new(StorageConsumer::new(settings.max_results, settings.failures_only)));
    if let Some(storage) = storage.as_ref() {
        extra.push(storage.clone());
    }
    if let Some(options) = config.debug {
        extra.push(Arc::new(DebugConsumer::new(options)));
    }

    info!(
        "Starting '{}': {} step(s), {} virtual user(s), {:?}.",
        scenario.name(),
        scenario.steps().len(),
        scenario.virtual_users(),
        scenario.run_mode()
    );
    let running = service.start(&scenario, extra)?;
    let (done_tx, done_rx) = shutdown_channel();
    let signals = setup_signal_canceller(running.canceller(), done_rx);
    let finished = running.finish().await;
    trigger_shutdown(&done_tx);
    if let Err(err) = signals.await {
        warn!("Signal handler ended abnormally: {}", err);
    }
    if show_progress && let Err(err) = finish_progress_line() {
        warn!("Failed to finish progress line: {}", err);
    }
    let outcome = finished?;

    if args.json {
        println!("{}", summary_json(&outcome)?);
    } else {
        for line in summary_lines(&outcome) {
            println!("{}", line);
        }
    }
    if let Some(storage) = storage.as_ref() {
        let results = storage.results();
        let failures = failure_lines(&results);
        if !failures.is_empty() {
            println!("Failures ({} kept):", failures.len());
            for line in failures {
                println!("  {}", line);
            }
        }
    }

    if let Some(store) = open_store(config).await {
        let record = outcome.to_record(args.target_id);
        info!("Storing load test result {}.", record.id);
        persist_detached(store, record).await?;
    }
    Ok(())
}

/// Checks every scenario once. Returns whether all targets are up.
pub(crate) async fn run_health(args: &HealthArgs, config: &EngineConfig) -> AppResult<bool> {
    let targets = args
        .scenarios
        .iter()
        .map(|path| {
            let scenario = load_scenario(path)?;
            let name = scenario.name().to_owned();
            Ok(MonitoredTarget::new(&name, scenario))
        })
        .collect::<AppResult<Vec<_>>>()?;
    let registry = StaticRegistry::new(targets);
    let records = check_all_targets(&orchestrator(config)?, &registry, &config.health).await?;

    for record in &records {
        println!("{}", health_line(record));
    }

    if let Some(store) = open_store(config).await {
        for record in &records {
            if let Err(err) = store.persist_health_check(record).await {
                error!(
                    "Failed to store health check for '{}': {}",
                    record.target_name, err
                );
            }
        }
    }

    Ok(records
        .iter()
        .all(|record| record.status == TargetStatus::Up))
}
