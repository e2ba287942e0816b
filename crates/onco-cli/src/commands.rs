use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::info;

use onco_core::{BatchOrchestrator, BatchRun, NullProgress, RunConfig};
use onco_ingest::scan_directory;
use onco_model::{CancellationToken, StepName};

use crate::cli::RunArgs;
use crate::progress::BarProgress;
use crate::summary::apply_table_style;

pub fn run_batch(args: &RunArgs) -> Result<BatchRun> {
    let config = RunConfig::from_file(&args.config)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.scan_dir.join("batch_output"));

    let patients = scan_directory(&args.scan_dir).context("scan directory")?;
    info!(
        patients = patients.len(),
        stages = config.stages.len(),
        "starting batch"
    );

    let orchestrator = BatchOrchestrator::new(config, output_dir);
    let cancel = CancellationToken::new();

    let run = if args.no_progress {
        orchestrator.run(&patients, &cancel, &NullProgress)
    } else {
        let bar = BarProgress::new();
        let run = orchestrator.run(&patients, &cancel, &bar);
        bar.finish();
        run
    };
    Ok(run)
}

pub fn run_stages() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Stage", "Scope"]);
    apply_table_style(&mut table);
    for name in StepName::all() {
        let scope = if name.is_batch_level() {
            "batch-level (runs once, after all patients)"
        } else if name.is_gating() {
            "per-patient (gating, always first)"
        } else {
            "per-patient"
        };
        table.add_row(vec![name.as_str(), scope]);
    }
    println!("{table}");
    Ok(())
}
