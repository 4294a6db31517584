use serde_json::Value;
use serde_json_path::JsonPath;
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::scenario::{ExtractionRule, ExtractionScheme};

use super::context::VariableContext;

/// Evaluates `expression` against a JSON body and returns the first match.
/// Strings come back verbatim, other values as their JSON text.
///
/// # Errors
///
/// Returns an error when the path does not parse, the body is not JSON, or
/// nothing matches.
pub fn extract_json_path(body: &str, expression: &str) -> Result<String, ExtractionError> {
    let document: Value =
        serde_json::from_str(body).map_err(|source| ExtractionError::BodyNotJson { source })?;
    extract_from_value(&document, expression)
}

fn extract_from_value(document: &Value, expression: &str) -> Result<String, ExtractionError> {
    let path = JsonPath::parse(expression).map_err(|source| ExtractionError::InvalidPath {
        expression: expression.to_owned(),
        source,
    })?;
    let found = path
        .query(document)
        .first()
        .ok_or_else(|| ExtractionError::NoMatch {
            expression: expression.to_owned(),
        })?;
    Ok(match found {
        Value::String(text) => text.clone(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            found.to_string()
        }
    })
}

/// Applies every rule to the response body. Failures are logged and leave the
/// variable untouched.
pub fn apply_extractions(rules: &[ExtractionRule], body: &str, context: &mut VariableContext) {
    if rules.is_empty() {
        return;
    }
    let mut document: Option<Result<Value, String>> = None;

    for rule in rules {
        let expression = match &rule.scheme {
            ExtractionScheme::JsonPath(expression) => expression,
            ExtractionScheme::Unsupported(raw) => {
                debug!(
                    "Ignoring extraction '{}' with unsupported expression '{}'.",
                    rule.variable, raw
                );
                continue;
            }
        };
        let parsed = document.get_or_insert_with(|| {
            serde_json::from_str::<Value>(body).map_err(|err| err.to_string())
        });
        let value = match parsed {
            Ok(value) => value,
            Err(message) => {
                warn!(
                    "Cannot extract '{}': response body is not JSON: {}",
                    rule.variable, message
                );
                continue;
            }
        };
        match extract_from_value(value, expression) {
            Ok(extracted) => context.set(&rule.variable, extracted),
            Err(err) => warn!("Cannot extract '{}': {}", rule.variable, err),
        }
    }
}
