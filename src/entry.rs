use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use crate::app::{run_health, run_load_test};
use crate::args::{CliArgs, Command};
use crate::config::{EngineConfig, load_config};
use crate::error::AppResult;

pub(crate) fn run() -> AppResult<ExitCode> {
    let args = CliArgs::parse();

    crate::logger::init_logging(args.verbose, args.no_color);

    let config = resolve_config(&args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args, config))
}

fn resolve_config(args: &CliArgs) -> AppResult<EngineConfig> {
    let mut config = match load_config(args.config.as_deref())? {
        Some(file) => EngineConfig::from_file(&file)?,
        None => EngineConfig::default(),
    };
    args.apply_to(&mut config);
    Ok(config)
}

async fn run_async(args: CliArgs, config: EngineConfig) -> AppResult<ExitCode> {
    match &args.command {
        Command::Run(run) => {
            run_load_test(run, &config, args.no_color).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Health(health) => {
            if run_health(health, &config).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                error!("At least one target is down.");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
