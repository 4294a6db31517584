use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use http::{HeaderMap, Method};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::error::{AppError, AppResult};
use crate::http::{InvokeError, Invoker};
use crate::result::{ErrorKind, Failure, HttpResponse, Outcome, ResolvedRequest, StepResult};

type Script = Box<dyn Fn(&ResolvedRequest) -> Result<HttpResponse, InvokeError> + Send + Sync>;

pub(crate) fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::from(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

pub(crate) fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HeaderMap::new(),
        body: body.to_owned(),
    }
}

pub(crate) fn step_result(step_index: usize, step_name: &str, latency_ms: u64, outcome: Outcome) -> StepResult {
    StepResult {
        worker_id: 0,
        iteration: 0,
        step_index,
        step_name: step_name.to_owned(),
        request: ResolvedRequest {
            method: Method::GET,
            url: "http://localhost/test".to_owned(),
            headers: HeaderMap::new(),
            body: None,
        },
        started_at: Utc::now(),
        duration: Duration::from_millis(latency_ms),
        outcome,
    }
}

pub(crate) fn ok_result(step_index: usize, step_name: &str, latency_ms: u64) -> StepResult {
    step_result(step_index, step_name, latency_ms, Outcome::Response(response(200, "{}")))
}

pub(crate) fn failed_result(step_index: usize, step_name: &str, kind: ErrorKind) -> StepResult {
    step_result(
        step_index,
        step_name,
        1,
        Outcome::Failure(Failure {
            kind,
            status: None,
            message: "failed".to_owned(),
        }),
    )
}

/// Invoker fake that answers from a closure, optionally after a delay.
pub(crate) struct ScriptedInvoker {
    script: Script,
    delay: Duration,
    calls: AtomicU64,
}

impl ScriptedInvoker {
    pub(crate) fn new<F>(script: F) -> Self
    where
        F: Fn(&ResolvedRequest) -> Result<HttpResponse, InvokeError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            delay: Duration::ZERO,
            calls: AtomicU64::new(0),
        }
    }

    pub(crate) fn ok(status: u16, body: &'static str) -> Self {
        Self::new(move |_| Ok(response(status, body)))
    }

    pub(crate) const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Invoker for ScriptedInvoker {
    async fn invoke(&self, request: &ResolvedRequest) -> Result<HttpResponse, InvokeError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.script)(request)
    }
}

/// Serves the same canned response to every connection on the current runtime.
pub(crate) async fn spawn_canned_server(status_line: &'static str, body: &'static str) -> AppResult<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buffer = [0u8; 4096];
                if stream.read(&mut buffer).await.is_err() {
                    return;
                }
                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                drop(stream.write_all(reply.as_bytes()).await);
                drop(stream.shutdown().await);
            });
        }
    });
    Ok(format!("http://{}", addr))
}

/// Accepts connections and never answers.
pub(crate) async fn spawn_silent_server() -> AppResult<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    Ok(format!("http://{}", addr))
}
