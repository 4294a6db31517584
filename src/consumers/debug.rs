use tracing::{info, warn};

use crate::error::ConsumerError;
use crate::result::{Outcome, StepResult};

use super::ResultConsumer;

const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugOptions {
    pub log_successful: bool,
    pub log_request_body: bool,
    pub log_response_body: bool,
}

impl DebugOptions {
    /// Failures only, without bodies.
    #[must_use]
    pub const fn failures_only() -> Self {
        Self {
            log_successful: false,
            log_request_body: false,
            log_response_body: false,
        }
    }
}

/// Logs one line per result of interest.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugConsumer {
    options: DebugOptions,
}

impl DebugConsumer {
    #[must_use]
    pub const fn new(options: DebugOptions) -> Self {
        Self { options }
    }

    fn describe(&self, result: &StepResult) -> String {
        let mut parts = vec![format!(
            "[worker {}, iter {}, step {}] {} {} - {} ({}ms)",
            result.worker_id,
            result.iteration,
            result.step_index,
            result.request.method,
            result.request.url,
            if result.success() { "SUCCESS" } else { "FAILED" },
            result.latency_ms()
        )];
        if let Some(failure) = result.failure() {
            parts.push(format!(" [{}: {}]", failure.kind, failure.message));
        }
        if let Some(status) = result.status() {
            parts.push(format!(" status: {}", status));
        }
        if self.options.log_request_body
            && let Some(body) = result.request.body.as_deref()
        {
            parts.push(format!("\n  request: {}", preview(body)));
        }
        if self.options.log_response_body
            && let Outcome::Response(response) = &result.outcome
        {
            parts.push(format!("\n  response: {}", preview(&response.body)));
        }
        parts.concat()
    }
}

pub(super) fn preview(body: &str) -> String {
    body.char_indices().nth(BODY_PREVIEW_CHARS).map_or_else(
        || body.to_owned(),
        |(cut, _)| body.get(..cut).map_or_else(String::new, |head| format!("{}...", head)),
    )
}

impl ResultConsumer for DebugConsumer {
    fn accept(&self, result: &StepResult) -> Result<(), ConsumerError> {
        if result.success() {
            if self.options.log_successful {
                info!("{}", self.describe(result));
            }
        } else {
            warn!("{}", self.describe(result));
        }
        Ok(())
    }
}
