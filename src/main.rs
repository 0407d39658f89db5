use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cases;
mod classify;
mod cli;
mod config;
mod corpus;
mod exec;
mod interrupt;
mod marker;
mod normalize;
mod pool;
mod reconcile;
mod report;
mod schedule;
mod util;
mod workflow;

use cli::RunArgs;
use config::RunConfig;
use workflow::RunStatus;

/// Exit code after a SIGINT-initiated stop, matching shell convention.
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> Result<ExitCode> {
    let args = RunArgs::parse();
    init_tracing(args.verbose);

    let config = RunConfig::from_args(args)?;
    match workflow::run(&config)? {
        RunStatus::Completed => Ok(ExitCode::SUCCESS),
        RunStatus::Interrupted => Ok(ExitCode::from(EXIT_INTERRUPTED)),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
