//! Oncology batch processor CLI.

use clap::{ColorChoice, Parser};
use std::io::{self, IsTerminal};

mod cli;
mod commands;
mod logging;
mod progress;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg};
use crate::commands::{run_batch, run_stages};
use crate::logging::{LogConfig, LogFormat, init_logging};
use crate::summary::{print_summary, print_summary_json};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Run(args) => match run_batch(&args) {
            Ok(run) => {
                let printed = if args.json {
                    print_summary_json(&run)
                } else {
                    print_summary(&run);
                    Ok(())
                };
                if let Err(error) = printed {
                    eprintln!("error: {error}");
                    1
                } else if run.succeeded() {
                    0
                } else {
                    1
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Stages => match run_stages() {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("error: {error}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !cli.verbosity.is_present();
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
