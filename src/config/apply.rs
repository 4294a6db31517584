use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::consumers::DebugOptions;
use crate::engine::{CompletionPolicy, ConcurrencyStrategy, EngineSettings};
use crate::error::{AppError, AppResult, ConfigError};
use crate::health::HealthSettings;
use crate::http::HttpSettings;

use super::types::{
    ConfigFile, DebugConfig, DurationValue, EngineSectionConfig, HealthConfig, HttpConfig,
    PolicyName, ProgressConfig, StorageConfig, StrategyName,
};

const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_MAX_RESULTS: usize = 1_000;

/// Keep individual results alongside the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageSettings {
    pub max_results: usize,
    pub failures_only: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            failures_only: true,
        }
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub http: HttpSettings,
    pub engine: EngineSettings,
    /// `None` disables progress reporting.
    pub progress_interval: Option<Duration>,
    pub health: HealthSettings,
    pub storage: Option<StorageSettings>,
    pub debug: Option<DebugOptions>,
    pub sqlite_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            http: HttpSettings::default(),
            engine: EngineSettings::default(),
            progress_interval: Some(DEFAULT_PROGRESS_INTERVAL),
            health: HealthSettings::default(),
            storage: None,
            debug: None,
            sqlite_path: None,
        }
    }
}

impl EngineConfig {
    /// Layers a config file over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is out of range or a duration does not
    /// parse.
    pub fn from_file(file: &ConfigFile) -> AppResult<Self> {
        let mut config = Self::default();
        if let Some(http) = file.http.as_ref() {
            apply_http(&mut config.http, http)?;
        }
        if let Some(engine) = file.engine.as_ref() {
            apply_engine(&mut config.engine, engine)?;
        }
        if let Some(progress) = file.progress.as_ref() {
            config.progress_interval = resolve_progress(progress);
        }
        if let Some(health) = file.health.as_ref() {
            apply_health(&mut config.health, health)?;
        }
        if let Some(storage) = file.storage.as_ref() {
            config.storage = Some(resolve_storage(storage)?);
        }
        if let Some(debug) = file.debug.as_ref() {
            config.debug = Some(resolve_debug(debug));
        }
        if let Some(path) = file.store.as_ref().and_then(|store| store.sqlite_path.as_ref()) {
            config.sqlite_path = Some(PathBuf::from(path));
        }
        Ok(config)
    }
}

fn apply_http(settings: &mut HttpSettings, http: &HttpConfig) -> AppResult<()> {
    if let Some(value) = http.connect_timeout.as_ref() {
        settings.connect_timeout = duration_field(value, "http.connect_timeout")?;
    }
    if let Some(value) = http.request_timeout.as_ref() {
        settings.request_timeout = duration_field(value, "http.request_timeout")?;
    }
    if let Some(value) = http.acquire_timeout.as_ref() {
        settings.acquire_timeout = duration_field(value, "http.acquire_timeout")?;
    }
    if let Some(max) = http.max_connections {
        settings.max_connections = positive(max, "http.max_connections")?.get();
    }
    if let Some(max) = http.max_idle_per_host {
        settings.max_idle_per_host = max;
    }
    if let Some(raise) = http.raise_for_status {
        settings.raise_for_status = raise;
    }
    if let Some(agent) = http.user_agent.as_ref() {
        settings.user_agent = Some(agent.clone());
    }
    if http.no_user_agent == Some(true) {
        settings.user_agent = None;
    }
    if let Some(insecure) = http.insecure {
        settings.insecure = insecure;
    }
    if let Some(path) = http.cacert.as_ref() {
        settings.cacert = Some(PathBuf::from(path));
    }
    Ok(())
}

fn apply_engine(settings: &mut EngineSettings, engine: &EngineSectionConfig) -> AppResult<()> {
    if let Some(policy) = engine.policy {
        settings.policy = match policy {
            PolicyName::BestEffort => CompletionPolicy::BestEffort,
            PolicyName::FailFast => CompletionPolicy::FailFast,
        };
    }
    let threads = engine
        .worker_threads
        .map(|threads| positive(threads, "engine.worker_threads"))
        .transpose()?;
    match (engine.strategy, threads) {
        (Some(StrategyName::Shared), Some(_)) => {
            return Err(AppError::config(ConfigError::WorkerThreadsWithoutDedicated));
        }
        (Some(StrategyName::Shared), None) => {
            settings.strategy = ConcurrencyStrategy::SharedRuntime;
        }
        (Some(StrategyName::Dedicated), threads) => {
            settings.strategy = ConcurrencyStrategy::DedicatedRuntime {
                worker_threads: threads.unwrap_or_else(default_worker_threads),
            };
        }
        (None, Some(worker_threads)) => {
            settings.strategy = ConcurrencyStrategy::DedicatedRuntime { worker_threads };
        }
        (None, None) => {}
    }
    if let Some(wait) = engine.wait_in_flight {
        settings.wait_in_flight = wait;
    }
    Ok(())
}

fn resolve_progress(progress: &ProgressConfig) -> Option<Duration> {
    if progress.enabled == Some(false) {
        return None;
    }
    Some(
        progress
            .interval_ms
            .map_or(DEFAULT_PROGRESS_INTERVAL, Duration::from_millis),
    )
}

fn apply_health(settings: &mut HealthSettings, health: &HealthConfig) -> AppResult<()> {
    if let Some(value) = health.timeout.as_ref() {
        settings.timeout = duration_field(value, "health.timeout")?;
    }
    if let Some(log) = health.log_failures {
        settings.log_failures = log;
    }
    Ok(())
}

fn resolve_storage(storage: &StorageConfig) -> AppResult<StorageSettings> {
    let defaults = StorageSettings::default();
    Ok(StorageSettings {
        max_results: storage
            .max_results
            .map(|max| positive(max, "storage.max_results"))
            .transpose()?
            .map_or(defaults.max_results, NonZeroUsize::get),
        failures_only: storage.failures_only.unwrap_or(defaults.failures_only),
    })
}

fn resolve_debug(debug: &DebugConfig) -> DebugOptions {
    DebugOptions {
        log_successful: debug.log_successful.unwrap_or(false),
        log_request_body: debug.log_request_body.unwrap_or(false),
        log_response_body: debug.log_response_body.unwrap_or(false),
    }
}

fn duration_field(value: &DurationValue, field: &'static str) -> AppResult<Duration> {
    value
        .to_duration()
        .map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
}

fn positive(value: usize, field: &'static str) -> AppResult<NonZeroUsize> {
    NonZeroUsize::new(value)
        .ok_or_else(|| AppError::config(ConfigError::FieldMustBePositive { field }))
}

fn default_worker_threads() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
