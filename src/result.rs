//! Immutable per-step outcome shared by every consumer.
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use http::{HeaderMap, Method};

/// Request exactly as it went out, after variable resolution.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// No response: connect failure, timeout or pool exhaustion.
    Connection,
    /// 4xx raised as an error.
    HttpClient,
    /// 5xx raised as an error.
    HttpServer,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Connection => "CONNECTION_ERROR",
            ErrorKind::HttpClient => "HTTP_CLIENT_ERROR",
            ErrorKind::HttpServer => "HTTP_SERVER_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Classification for an error status code; `None` below 400.
    #[must_use]
    pub const fn from_status(status: u16) -> Option<Self> {
        match status {
            400..=499 => Some(ErrorKind::HttpClient),
            500..=599 => Some(ErrorKind::HttpServer),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Failure {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Response(HttpResponse),
    Failure(Failure),
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub worker_id: usize,
    pub iteration: u64,
    pub step_index: usize,
    pub step_name: String,
    pub request: ResolvedRequest,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub outcome: Outcome,
}

impl StepResult {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.outcome, Outcome::Response(_))
    }

    /// Whole milliseconds, truncated.
    #[must_use]
    pub fn latency_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match &self.outcome {
            Outcome::Response(response) => Some(response.status),
            Outcome::Failure(failure) => failure.status,
        }
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            Outcome::Response(_) => None,
            Outcome::Failure(failure) => Some(failure),
        }
    }

    #[must_use]
    pub const fn response(&self) -> Option<&HttpResponse> {
        match &self.outcome {
            Outcome::Response(response) => Some(response),
            Outcome::Failure(_) => None,
        }
    }
}
