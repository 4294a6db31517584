//! Core library for the `loadprobe` CLI.
//!
//! A scenario is an ordered list of HTTP request templates run by a number
//! of virtual users, either for a fixed number of iterations or for a fixed
//! duration. Values extracted from one response feed later requests. Every
//! step result streams into [`consumers::ResultConsumer`]s that aggregate
//! metrics, report progress, keep raw results, or decide health.
pub mod args;
pub mod config;
pub mod consumers;
pub mod engine;
pub mod error;
pub mod health;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod result;
pub mod scenario;
pub mod service;
pub mod shutdown;
pub mod store;
pub mod workload;

#[cfg(test)]
pub(crate) mod test_support;
