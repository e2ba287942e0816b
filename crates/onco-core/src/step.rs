//! The polymorphic unit of work over one patient's resolved set.

use anyhow::Result;

use onco_ingest::ResolvedFileSet;
use onco_model::{CancellationToken, FileRole, RoleTable, StepName, StepOutcome};

use crate::context::{BatchContext, PatientContext};
use crate::progress::ProgressSink;

/// A per-patient processing step.
///
/// `run` must check the cancellation token at least once before doing any
/// destructive work and again before any final write; on a set token it
/// returns an `INTERRUPT` outcome without partial writes. Expected
/// domain-absence conditions never propagate as errors — each maps to a
/// fixed reason code. Only genuinely unexpected conditions (corrupt
/// required files, programming errors) may return `Err`, which aborts the
/// run.
pub trait ProcessStep: Send + Sync {
    fn name(&self) -> StepName;

    /// The SOP-Class → role table this step type classifies against.
    fn role_table(&self) -> RoleTable;

    fn required_roles(&self) -> &'static [FileRole];

    /// Readiness: every required role has at least one resolved entry. A
    /// not-ready step short-circuits with `SKIP` instead of running.
    fn ready(&self, resolved: &ResolvedFileSet) -> bool {
        resolved.is_ready(self.required_roles())
    }

    fn run(
        &self,
        ctx: &mut PatientContext<'_>,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<StepOutcome>;
}

/// A batch-level step: runs exactly once, after all patients.
pub trait BatchStep: Send + Sync {
    fn name(&self) -> StepName;

    fn run(
        &self,
        ctx: &BatchContext<'_>,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<StepOutcome>;
}
