//! SAEV pipeline CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use saev_cli::logging::{LogConfig, LogFormat, init_logging};
use saev_model::PipelineOutcome;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_pipeline, run_replicate, run_transform, run_validate};
use crate::summary::print_outcome;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let (result, json) = match &cli.command {
        Command::Run(args) => (run_pipeline(args), args.store.json),
        Command::Validate(args) => (run_validate(args), args.json),
        Command::Transform(args) => (run_transform(args), args.store.json),
        Command::Replicate(args) => (run_replicate(args), args.store.json),
    };
    let exit_code = match result.and_then(|outcome| report(&outcome, json)) {
        Ok(success) => i32::from(!success),
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Prints the outcome and returns whether the run succeeded.
fn report(outcome: &PipelineOutcome, json: bool) -> anyhow::Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        print_outcome(outcome);
    }
    Ok(outcome.is_success())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !(cli.verbosity.is_present() || cli.log_level.is_some()),
        ..LogConfig::default()
    };
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
