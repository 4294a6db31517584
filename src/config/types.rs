use std::time::Duration;

use serde::Deserialize;

use crate::error::ValidationError;

/// On-disk configuration. Every field is optional; absent values keep their
/// defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub http: Option<HttpConfig>,
    pub engine: Option<EngineSectionConfig>,
    pub progress: Option<ProgressConfig>,
    pub health: Option<HealthConfig>,
    pub storage: Option<StorageConfig>,
    pub debug: Option<DebugConfig>,
    pub store: Option<StoreConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout: Option<DurationValue>,
    pub request_timeout: Option<DurationValue>,
    #[serde(alias = "pool_timeout")]
    pub acquire_timeout: Option<DurationValue>,
    pub max_connections: Option<usize>,
    pub max_idle_per_host: Option<usize>,
    pub raise_for_status: Option<bool>,
    pub user_agent: Option<String>,
    pub no_user_agent: Option<bool>,
    pub insecure: Option<bool>,
    pub cacert: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyName {
    BestEffort,
    FailFast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyName {
    Shared,
    Dedicated,
}

#[derive(Debug, Default, Deserialize)]
pub struct EngineSectionConfig {
    pub policy: Option<PolicyName>,
    pub strategy: Option<StrategyName>,
    pub worker_threads: Option<usize>,
    pub wait_in_flight: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgressConfig {
    pub enabled: Option<bool>,
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthConfig {
    pub timeout: Option<DurationValue>,
    pub log_failures: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    pub max_results: Option<usize>,
    pub failures_only: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DebugConfig {
    pub log_successful: Option<bool>,
    pub log_request_body: Option<bool>,
    pub log_response_body: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    pub sqlite_path: Option<String>,
}

/// Either whole seconds or a string with a unit suffix.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
