use std::sync::Arc;

use chrono::Utc;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::debug;

use crate::error::{AppError, AppResult, HttpError};
use crate::http::Invoker;
use crate::result::{Outcome, ResolvedRequest, StepResult};
use crate::scenario::{RequestTemplate, Step};

use super::context::{Builtins, VariableContext};
use super::extract::apply_extractions;
use super::template::render_template;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Position of a step inside a run, carried into its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPosition {
    pub worker_id: usize,
    pub iteration: u64,
    pub step_index: usize,
}

/// Executes steps through a shared invoker.
#[derive(Clone)]
pub struct StepExecutor {
    invoker: Arc<dyn Invoker>,
}

impl StepExecutor {
    #[must_use]
    pub const fn new(invoker: Arc<dyn Invoker>) -> Self {
        Self { invoker }
    }

    /// Resolves, sends and classifies one step, then applies its extractions
    /// to `context` when a response came back.
    ///
    /// # Errors
    ///
    /// Returns an error when the template names an unsupported method, an
    /// invalid header, or a body that cannot be serialized. Request failures
    /// are not errors; they come back as a failed [`StepResult`].
    pub async fn execute(
        &self,
        step: &Step,
        position: StepPosition,
        context: &mut VariableContext,
    ) -> AppResult<StepResult> {
        let builtins = Builtins::now();
        let request = resolve_request(&step.request, &builtins, context)?;

        let started_at = Utc::now();
        let start = Instant::now();
        let outcome = match self.invoker.invoke(&request).await {
            Ok(response) => Outcome::Response(response),
            Err(err) => Outcome::Failure(err.into()),
        };
        let duration = start.elapsed();

        if let Outcome::Response(response) = &outcome {
            apply_extractions(&step.extract, &response.body, context);
        }

        let result = StepResult {
            worker_id: position.worker_id,
            iteration: position.iteration,
            step_index: position.step_index,
            step_name: step.name.clone(),
            request,
            started_at,
            duration,
            outcome,
        };
        debug!(
            "worker {} iteration {} step '{}' -> {} in {}ms",
            result.worker_id,
            result.iteration,
            result.step_name,
            describe_outcome(&result),
            result.latency_ms()
        );
        Ok(result)
    }
}

fn describe_outcome(result: &StepResult) -> String {
    match &result.outcome {
        Outcome::Response(response) => response.status.to_string(),
        Outcome::Failure(failure) => failure.kind.to_string(),
    }
}

/// Applies variable resolution to every templated part of a request.
///
/// # Errors
///
/// Returns an error for an unsupported method, an invalid header name or
/// value, or a body that cannot be serialized.
pub fn resolve_request(
    template: &RequestTemplate,
    builtins: &Builtins,
    context: &VariableContext,
) -> AppResult<ResolvedRequest> {
    let method = parse_method(&template.method)?;
    let url = render_template(&template.url, builtins, context);

    let mut headers = HeaderMap::with_capacity(template.headers.len());
    for (name, value) in &template.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            AppError::http(HttpError::InvalidHeaderName {
                header: name.clone(),
                source: err,
            })
        })?;
        let rendered = render_template(value, builtins, context);
        let header_value = HeaderValue::from_str(&rendered).map_err(|err| {
            AppError::http(HttpError::InvalidHeaderValue {
                header: name.clone(),
                source: err,
            })
        })?;
        headers.insert(header_name, header_value);
    }

    let body = match template.body.as_ref().filter(|body| !body.is_empty()) {
        Some(body) => {
            let rendered = render_object(body, builtins, context);
            let text = serde_json::to_string(&rendered)
                .map_err(|err| AppError::http(HttpError::SerializeBody { source: err }))?;
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            }
            Some(text)
        }
        None => None,
    };

    Ok(ResolvedRequest {
        method,
        url,
        headers,
        body,
    })
}

fn parse_method(raw: &str) -> AppResult<Method> {
    let method = match raw.trim().to_ascii_uppercase().as_str() {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "PATCH" => Method::PATCH,
        "DELETE" => Method::DELETE,
        "HEAD" => Method::HEAD,
        "OPTIONS" => Method::OPTIONS,
        "TRACE" => Method::TRACE,
        _ => {
            return Err(AppError::http(HttpError::UnsupportedMethod {
                method: raw.to_owned(),
            }));
        }
    };
    Ok(method)
}

fn render_object(
    body: &Map<String, Value>,
    builtins: &Builtins,
    context: &VariableContext,
) -> Map<String, Value> {
    body.iter()
        .map(|(key, value)| (key.clone(), render_value(value, builtins, context)))
        .collect()
}

fn render_value(value: &Value, builtins: &Builtins, context: &VariableContext) -> Value {
    match value {
        Value::String(text) => Value::String(render_template(text, builtins, context)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_value(item, builtins, context))
                .collect(),
        ),
        Value::Object(fields) => Value::Object(render_object(fields, builtins, context)),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}
