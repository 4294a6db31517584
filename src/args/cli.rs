use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use super::parsers::{parse_duration_arg, parse_positive_usize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Scenario-driven HTTP load tester and health checker - concurrent virtual users, chained variable extraction, and latency percentiles."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (.toml or .json); defaults to ./loadprobe.toml or ./loadprobe.json
    #[arg(long, short = 'c', global = true, env = "LOADPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log per-step detail
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Stop the whole run on the first worker failure
    #[arg(long = "fail-fast", global = true)]
    pub fail_fast: bool,

    /// Count 4xx/5xx responses as failures
    #[arg(long = "raise-for-status", global = true)]
    pub raise_for_status: bool,

    /// SQLite database to record results in
    #[arg(long = "db", global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a load test from a scenario file
    Run(RunArgs),
    /// Run each scenario once and report UP/DOWN
    Health(HealthArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Scenario definition (JSON)
    pub scenario: PathBuf,

    /// Hide the progress line
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Keep up to N individual results and print the failures
    #[arg(long = "keep-results", value_parser = parse_positive_usize)]
    pub keep_results: Option<NonZeroUsize>,

    /// Keep successful results too (with --keep-results)
    #[arg(long = "all-results", requires = "keep_results")]
    pub all_results: bool,

    /// Log every result with request and response bodies
    #[arg(long = "debug-requests")]
    pub debug_requests: bool,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", value_parser = parse_duration_arg)]
    pub request_timeout: Option<Duration>,

    /// Maximum concurrent connections
    #[arg(long = "max-connections", value_parser = parse_positive_usize)]
    pub max_connections: Option<NonZeroUsize>,

    /// Run workers on a dedicated runtime with N threads
    #[arg(long = "threads", value_parser = parse_positive_usize)]
    pub threads: Option<NonZeroUsize>,

    /// Target the stored result belongs to
    #[arg(long = "target-id")]
    pub target_id: Option<Uuid>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct HealthArgs {
    /// Scenario definitions (JSON), one target each
    #[arg(required = true, num_args = 1..)]
    pub scenarios: Vec<PathBuf>,

    /// Longest a single check may take (supports ms/s/m/h)
    #[arg(long = "timeout", value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,
}
