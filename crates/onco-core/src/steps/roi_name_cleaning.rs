//! Batch-level ROI name cleaning.
//!
//! Applies the caller-supplied per-dataset rename/delete map across every
//! patient's structure set; runs once, after the per-patient loop.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::info;

use onco_ingest::{classify_paths, resolve};
use onco_model::{
    CancellationToken, FileRole, ReasonCode, RoleTable, StepName, StepOutcome, sop_class,
};

use crate::config::RoiNameChange;
use crate::context::BatchContext;
use crate::progress::ProgressSink;
use crate::step::BatchStep;

pub struct RoiNameCleaning;

impl BatchStep for RoiNameCleaning {
    fn name(&self) -> StepName {
        StepName::RoiNameCleaning
    }

    fn run(
        &self,
        ctx: &BatchContext<'_>,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<StepOutcome> {
        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }
        if ctx.config.roi_name_cleaning.is_empty() {
            return Ok(StepOutcome::failure(ReasonCode::RoiCleanNoMap));
        }

        let table =
            RoleTable::new().with(sop_class::RT_STRUCTURE_SET, FileRole::Rtss, false);
        let out_dir = ctx.step_output_dir(self.name().as_str());
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("create step output directory {}", out_dir.display()))?;

        let total = ctx.patients.len().max(1);
        let mut cleaned = 0usize;
        for (index, patient) in ctx.patients.iter().enumerate() {
            if cancel.is_set() {
                return Ok(StepOutcome::interrupt());
            }
            progress.emit(
                &format!("cleaning ROI names: {}", patient.patient_id),
                (index * 100 / total) as u8,
            );

            let changes = ctx.config.cleaning_changes_for(&patient.patient_id);
            if changes.is_empty() {
                continue;
            }
            let mut renames = BTreeMap::new();
            let mut deletions = Vec::new();
            for change in changes {
                match change {
                    RoiNameChange::Rename { from, to } => {
                        renames.insert(from.clone(), to.clone());
                    }
                    RoiNameChange::Delete { from } => deletions.push(from.clone()),
                }
            }

            let classified = classify_paths(&patient.all_paths(), &table)?;
            let set = resolve(&patient.patient_id, classified);
            let Some(current) = set.singleton(FileRole::Rtss) else {
                continue;
            };
            let mut updated = current.clone();
            let renamed = onco_dicom::rtss::rename_rois(&mut updated, &renames);
            let removed = onco_dicom::rtss::remove_rois(&mut updated, &deletions);
            if renamed == 0 && removed == 0 {
                continue;
            }

            if cancel.is_set() {
                return Ok(StepOutcome::interrupt());
            }
            let path = out_dir.join(format!("{}_rtss.dcm", patient.patient_id));
            updated
                .write_to(&path)
                .with_context(|| format!("write cleaned structure set {}", path.display()))?;
            cleaned += 1;
        }

        info!(cleaned, "ROI name cleaning finished");
        Ok(StepOutcome::success())
    }
}
