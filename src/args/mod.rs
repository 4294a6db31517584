//! Command-line arguments.
mod cli;
mod overrides;
mod parsers;


pub use cli::{CliArgs, Command, HealthArgs, RunArgs};
