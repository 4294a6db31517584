use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;

use crate::error::{AppError, AppResult, HttpError};

const DEFAULT_USER_AGENT: &str = concat!("loadprobe/", env!("CARGO_PKG_VERSION"));

/// Connection pool and timeout settings shared by every worker of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Longest a request waits for a free connection slot.
    pub acquire_timeout: Duration,
    pub max_connections: usize,
    pub max_idle_per_host: usize,
    /// Map 4xx/5xx responses to client/server error failures.
    pub raise_for_status: bool,
    pub user_agent: Option<String>,
    pub insecure: bool,
    pub cacert: Option<PathBuf>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            acquire_timeout: Duration::from_secs(3),
            max_connections: 500,
            max_idle_per_host: 100,
            raise_for_status: false,
            user_agent: Some(DEFAULT_USER_AGENT.to_owned()),
            insecure: false,
            cacert: None,
        }
    }
}

/// Builds the pooled client from settings.
///
/// # Errors
///
/// Returns an error when the CA certificate cannot be loaded or the client
/// cannot be constructed.
pub fn build_client(settings: &HttpSettings) -> AppResult<Client> {
    let mut client_builder = Client::builder()
        .timeout(settings.request_timeout)
        .connect_timeout(settings.connect_timeout)
        .pool_max_idle_per_host(settings.max_idle_per_host);

    if let Some(user_agent) = settings.user_agent.as_ref() {
        client_builder = client_builder.user_agent(user_agent.as_str());
    }

    if let Some(path) = settings.cacert.as_ref() {
        let bytes = std::fs::read(path).map_err(|err| {
            AppError::http(HttpError::ReadCacert {
                path: path.clone(),
                source: err,
            })
        })?;
        let cert = reqwest::Certificate::from_pem(&bytes).map_err(|err| {
            AppError::http(HttpError::InvalidCacert {
                path: path.clone(),
                source: err,
            })
        })?;
        client_builder = client_builder.add_root_certificate(cert);
    }

    if settings.insecure {
        client_builder = client_builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    client_builder
        .build()
        .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))
}
