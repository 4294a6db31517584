use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::error::AppResult;
use crate::result::{ErrorKind, Failure, HttpResponse, ResolvedRequest};

use super::client::{HttpSettings, build_client};

/// A request that produced no usable response.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct InvokeError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl InvokeError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }
}

impl From<InvokeError> for Failure {
    fn from(error: InvokeError) -> Self {
        Failure {
            kind: error.kind,
            status: error.status,
            message: error.message,
        }
    }
}

/// Sends one resolved request. Shared read-only by every worker.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, request: &ResolvedRequest) -> Result<HttpResponse, InvokeError>;
}

/// `reqwest`-backed invoker. A semaphore bounds concurrent connections and
/// waiting for a slot is limited by the acquire timeout.
#[derive(Debug, Clone)]
pub struct ReqwestInvoker {
    client: Client,
    slots: Arc<Semaphore>,
    acquire_timeout: Duration,
    raise_for_status: bool,
}

impl ReqwestInvoker {
    #[must_use]
    pub fn new(client: Client, settings: &HttpSettings) -> Self {
        Self {
            client,
            slots: Arc::new(Semaphore::new(settings.max_connections.max(1))),
            acquire_timeout: settings.acquire_timeout,
            raise_for_status: settings.raise_for_status,
        }
    }

    /// Builds the client and the invoker in one go.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built.
    pub fn from_settings(settings: &HttpSettings) -> AppResult<Self> {
        Ok(Self::new(build_client(settings)?, settings))
    }
}

#[async_trait]
impl Invoker for ReqwestInvoker {
    async fn invoke(&self, request: &ResolvedRequest) -> Result<HttpResponse, InvokeError> {
        let url = Url::parse(&request.url)
            .map_err(|err| InvokeError::unknown(format!("Invalid url '{}': {}", request.url, err)))?;

        let _slot = match tokio::time::timeout(self.acquire_timeout, self.slots.acquire()).await {
            Ok(Ok(slot)) => slot,
            Ok(Err(err)) => return Err(InvokeError::connection(err.to_string())),
            Err(_elapsed) => {
                return Err(InvokeError::connection(format!(
                    "No connection available within {}ms.",
                    self.acquire_timeout.as_millis()
                )));
            }
        };

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(body) = request.body.as_ref() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|err| classify_transport(&err))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|err| classify_transport(&err))?;

        if self.raise_for_status
            && let Some(kind) = ErrorKind::from_status(status)
        {
            return Err(InvokeError {
                kind,
                status: Some(status),
                message: format!("HTTP status {}", status),
            });
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify_transport(err: &reqwest::Error) -> InvokeError {
    let kind = if err.is_builder() {
        ErrorKind::Unknown
    } else if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        ErrorKind::Connection
    } else {
        ErrorKind::Unknown
    };
    InvokeError {
        kind,
        status: err.status().map(|status| status.as_u16()),
        message: err.to_string(),
    }
}
