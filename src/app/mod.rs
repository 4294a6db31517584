//! Command execution: wiring, terminal output, and signal handling.
mod progress;
mod runner;
mod signals;
mod summary;

pub(crate) use runner::{run_health, run_load_test};
