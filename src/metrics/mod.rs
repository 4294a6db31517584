//! Aggregate statistics produced by the metrics consumer.
mod percentiles;
mod types;

#[cfg(test)]
mod tests;

pub use percentiles::{average, format_x100, percentile, rate_x100};
pub use types::{LatencyStats, MetricsSnapshot, StepKey, StepMetrics};
