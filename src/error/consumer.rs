use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("Consumer '{consumer}' failed: {message}")]
    Rejected {
        consumer: &'static str,
        message: String,
    },
    #[error("Progress output failed: {source}")]
    ProgressOutput {
        #[source]
        source: std::io::Error,
    },
}
