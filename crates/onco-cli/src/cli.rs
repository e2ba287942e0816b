//! CLI argument definitions for the batch processor.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "onco-batch",
    version,
    about = "Batch processing for oncology imaging records",
    long_about = "Batch-process per-patient DICOM collections through a configured\n\
                  sequence of operations: dose-to-ROI conversion, radiomics and DVH\n\
                  export, clinical-data import/export, ROI renaming, and subgroup\n\
                  filtering."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a configured batch over a scanned directory tree.
    Run(RunArgs),

    /// List all known stages.
    Stages,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Directory tree containing the patients' DICOM files.
    #[arg(value_name = "SCAN_DIR")]
    pub scan_dir: PathBuf,

    /// Run configuration (JSON: stage list plus per-step options).
    #[arg(long = "config", value_name = "PATH")]
    pub config: PathBuf,

    /// Output directory for generated files (default: <SCAN_DIR>/batch_output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the summary as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
