mod app;
mod args;
mod config;
mod consumers;
mod engine;
mod entry;
mod error;
mod health;
mod http;
mod logger;
mod metrics;
mod result;
mod scenario;
mod service;
mod shutdown;
mod store;
mod workload;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;

fn main() -> ExitCode {
    match entry::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
