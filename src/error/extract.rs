use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid JSONPath '{expression}': {source}")]
    InvalidPath {
        expression: String,
        #[source]
        source: serde_json_path::ParseError,
    },
    #[error("Response body is not JSON: {source}")]
    BodyNotJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("JSONPath '{expression}' matched nothing.")]
    NoMatch { expression: String },
}
