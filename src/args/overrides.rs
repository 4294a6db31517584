use crate::config::{EngineConfig, StorageSettings};
use crate::consumers::DebugOptions;
use crate::engine::{CompletionPolicy, ConcurrencyStrategy};

use super::cli::{CliArgs, Command};

impl CliArgs {
    /// Command-line flags win over config file values.
    pub fn apply_to(&self, config: &mut EngineConfig) {
        if self.fail_fast {
            config.engine.policy = CompletionPolicy::FailFast;
        }
        if self.raise_for_status {
            config.http.raise_for_status = true;
        }
        if let Some(path) = self.db.as_ref() {
            config.sqlite_path = Some(path.clone());
        }

        match &self.command {
            Command::Run(run) => {
                if run.no_progress || run.json {
                    config.progress_interval = None;
                }
                if let Some(max_results) = run.keep_results {
                    config.storage = Some(StorageSettings {
                        max_results: max_results.get(),
                        failures_only: !run.all_results,
                    });
                }
                if run.debug_requests {
                    config.debug = Some(DebugOptions {
                        log_successful: true,
                        log_request_body: true,
                        log_response_body: true,
                    });
                }
                if let Some(timeout) = run.request_timeout {
                    config.http.request_timeout = timeout;
                }
                if let Some(max) = run.max_connections {
                    config.http.max_connections = max.get();
                }
                if let Some(worker_threads) = run.threads {
                    config.engine.strategy = ConcurrencyStrategy::DedicatedRuntime { worker_threads };
                }
            }
            Command::Health(health) => {
                if let Some(timeout) = health.timeout {
                    config.health.timeout = timeout;
                }
            }
        }
    }
}
