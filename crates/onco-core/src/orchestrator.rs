//! The batch orchestrator: patient loop, stage ordering, cancellation.
//!
//! Stage machine: `Init → PerPatientLoop → BatchLevelStages → Done`, with
//! `Aborted` reachable from the patient loop. The ordering contract is
//! fixed: the gating `select_subgroup` stage runs first for each patient
//! regardless of its configured position; the remaining per-patient stages
//! run in caller-supplied order; the reserved batch-level stages are
//! deferred and run exactly once after all patients.
//!
//! Cancellation is run-wide: once observed anywhere, the whole batch
//! aborts. Subgroup exclusion is patient-scoped: it only stops the current
//! patient's remaining stages. The summary is returned on every path,
//! complete for every patient processed before an abort.

use std::path::PathBuf;

use tracing::{info, info_span, warn};

use onco_ingest::resolve_patient;
use onco_model::{BatchSummary, CancellationToken, PatientRecord, StepName, StepOutcome};

use crate::config::RunConfig;
use crate::context::{BatchContext, PatientContext, ValueCache};
use crate::progress::ProgressSink;
use crate::registry::StepRegistry;

/// Terminal state of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// The cancellation token was observed; the batch aborted run-wide.
    Cancelled,
    /// An unexpected error aborted the batch (distinct from cancellation).
    Errored(String),
}

/// What a run returns: the summary is always present, whatever the status.
#[derive(Debug)]
pub struct BatchRun {
    pub summary: BatchSummary,
    pub status: RunStatus,
}

impl BatchRun {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }
}

pub struct BatchOrchestrator {
    registry: StepRegistry,
    config: RunConfig,
    output_dir: PathBuf,
}

impl BatchOrchestrator {
    pub fn new(config: RunConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self::with_registry(config, output_dir, StepRegistry::standard())
    }

    pub fn with_registry(
        config: RunConfig,
        output_dir: impl Into<PathBuf>,
        registry: StepRegistry,
    ) -> Self {
        Self {
            registry,
            config,
            output_dir: output_dir.into(),
        }
    }

    /// Drives the whole batch over the resolved patient collection, in its
    /// native order.
    pub fn run(
        &self,
        patients: &[PatientRecord],
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> BatchRun {
        let mut cache = ValueCache::new();
        self.run_with_cache(patients, cancel, progress, &mut cache)
    }

    /// Like [`run`](Self::run), but over a caller-owned value cache. The
    /// cache is cleared once per run, on every terminal path.
    pub fn run_with_cache(
        &self,
        patients: &[PatientRecord],
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
        cache: &mut ValueCache,
    ) -> BatchRun {
        // Init: fresh summary, token reset.
        let mut summary = BatchSummary::new();
        cancel.clear();

        let gating: Option<StepName> = self
            .config
            .stages
            .iter()
            .copied()
            .find(StepName::is_gating);
        let per_patient: Vec<StepName> = self
            .config
            .stages
            .iter()
            .copied()
            .filter(|stage| !stage.is_batch_level() && !stage.is_gating())
            .collect();
        let batch_stages: Vec<StepName> = self
            .config
            .stages
            .iter()
            .copied()
            .filter(StepName::is_batch_level)
            .collect();
        let role_table = self.registry.union_role_table(&self.config.stages);

        let stage_total = per_patient.len() + usize::from(gating.is_some());

        for patient in patients {
            // Guaranteed suspension point (a): top of each patient
            // iteration. Cancellation here is run-wide.
            if cancel.is_set() {
                cache.clear();
                return BatchRun {
                    summary,
                    status: RunStatus::Cancelled,
                };
            }

            let span = info_span!("patient", id = %patient.patient_id);
            let _guard = span.enter();
            progress.emit(&format!("Processing {}", patient.patient_id), 0);

            let resolved = match resolve_patient(patient, &role_table) {
                Ok(resolved) => resolved,
                Err(error) => {
                    warn!(%error, "aborting run: patient data cannot be interpreted");
                    cache.clear();
                    return BatchRun {
                        summary,
                        status: RunStatus::Errored(format!(
                            "{}: {error}",
                            patient.patient_id
                        )),
                    };
                }
            };
            let mut ctx =
                PatientContext::new(resolved, &mut *cache, &self.output_dir, &self.config);
            let mut completed_stages = 0usize;

            // The gating stage always runs first, wherever it was
            // configured; its negative result is patient-scoped.
            if let Some(gate) = gating {
                let outcome = match self.run_per_patient_stage(gate, &mut ctx, cancel, progress) {
                    Ok(outcome) => outcome,
                    Err(error) => {
                        ctx.cache.clear();
                        return BatchRun {
                            summary,
                            status: RunStatus::Errored(format!("{gate}: {error:#}")),
                        };
                    }
                };
                summary.record_patient(&patient.patient_id, gate, outcome);
                if outcome.is_interrupt() {
                    ctx.cache.clear();
                    return BatchRun {
                        summary,
                        status: RunStatus::Cancelled,
                    };
                }
                completed_stages += 1;
                progress.emit(
                    &format!("{}: {gate}", patient.patient_id),
                    stage_percent(completed_stages, stage_total),
                );
                if outcome.within_filter != Some(true) {
                    info!("patient outside subgroup, skipping remaining stages");
                    continue;
                }
            }

            for stage in &per_patient {
                // Guaranteed suspension point (b): before each stage run.
                if cancel.is_set() {
                    ctx.cache.clear();
                    return BatchRun {
                        summary,
                        status: RunStatus::Cancelled,
                    };
                }
                let outcome =
                    match self.run_per_patient_stage(*stage, &mut ctx, cancel, progress) {
                        Ok(outcome) => outcome,
                        Err(error) => {
                            ctx.cache.clear();
                            return BatchRun {
                                summary,
                                status: RunStatus::Errored(format!("{stage}: {error:#}")),
                            };
                        }
                    };
                summary.record_patient(&patient.patient_id, *stage, outcome);
                if outcome.is_interrupt() {
                    ctx.cache.clear();
                    return BatchRun {
                        summary,
                        status: RunStatus::Cancelled,
                    };
                }
                completed_stages += 1;
                progress.emit(
                    &format!("{}: {stage}", patient.patient_id),
                    stage_percent(completed_stages, stage_total),
                );
            }
            // The patient's resolved set is dropped whole here, before the
            // next patient's resolution begins.
        }

        for stage in &batch_stages {
            if cancel.is_set() {
                cache.clear();
                return BatchRun {
                    summary,
                    status: RunStatus::Cancelled,
                };
            }
            // Percent resets at the start of each batch-level stage.
            progress.emit(&format!("Batch stage: {stage}"), 0);
            let Some(step) = self.registry.batch_level(*stage) else {
                cache.clear();
                return BatchRun {
                    summary,
                    status: RunStatus::Errored(format!("{stage}: not registered")),
                };
            };
            let ctx = BatchContext {
                patients,
                output_dir: &self.output_dir,
                config: &self.config,
            };
            let outcome = match step.run(&ctx, cancel, progress) {
                Ok(outcome) => outcome,
                Err(error) => {
                    cache.clear();
                    return BatchRun {
                        summary,
                        status: RunStatus::Errored(format!("{stage}: {error:#}")),
                    };
                }
            };
            summary.record_batch(*stage, outcome);
            if outcome.is_interrupt() {
                cache.clear();
                return BatchRun {
                    summary,
                    status: RunStatus::Cancelled,
                };
            }
            progress.emit(&format!("Batch stage: {stage}"), 100);
        }

        cache.clear();
        BatchRun {
            summary,
            status: RunStatus::Completed,
        }
    }

    fn run_per_patient_stage(
        &self,
        stage: StepName,
        ctx: &mut PatientContext<'_>,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> anyhow::Result<StepOutcome> {
        let Some(step) = self.registry.per_patient(stage) else {
            anyhow::bail!("stage not registered");
        };
        if !step.ready(&ctx.resolved) {
            info!(
                %stage,
                missing = ?ctx.resolved.missing_roles(step.required_roles()),
                "required roles missing, skipping"
            );
            return Ok(StepOutcome::skip());
        }
        step.run(ctx, cancel, progress)
    }
}

fn stage_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        100
    } else {
        (completed * 100 / total).min(100) as u8
    }
}
