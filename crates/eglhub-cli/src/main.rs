//! eglhub CLI - inspect displays and driver matching

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use eglhub::{LogLevel, RuntimeConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = RuntimeConfig::process().clone();
    if let Some(driver) = &cli.driver {
        config = config.with_driver(driver.clone());
    }
    if let Some(args) = &cli.driver_args {
        config = config.with_driver_args(args.clone());
    }
    match cli.verbose {
        0 => {},
        1 => config = config.with_log_level(LogLevel::Info),
        _ => config = config.with_log_level(LogLevel::Debug),
    }

    // EGL_LOG_LEVEL sets the default; RUST_LOG still wins
    env_logger::Builder::new()
        .filter_level(config.log_level().to_level_filter())
        .parse_default_env()
        .init();

    let runtime = eglhub::runtime(config);
    let result = match &cli.command {
        Commands::Info(args) => commands::info::run(&runtime, args),
        Commands::Probe(args) => commands::probe::run(&runtime, args),
        Commands::Proc(args) => commands::lookup::run(&runtime, args),
    };

    if let Some(report) = runtime.shutdown() {
        log::debug!(
            "Freed {} displays ({} with resources)",
            report.displays_freed,
            report.displays_with_resources
        );
    }
    result
}
