mod app;
mod config;
mod consumer;
mod engine;
mod extract;
mod http;
mod store;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use consumer::ConsumerError;
pub use engine::{EngineError, WorkerFailure};
pub use extract::ExtractionError;
pub use http::HttpError;
pub use store::StoreError;
pub use validation::ValidationError;
