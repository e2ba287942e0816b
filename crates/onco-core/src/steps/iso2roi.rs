//! Isodose-to-ROI conversion.
//!
//! Traces the boundary of each configured isodose level (as a percentage of
//! the plan's target prescription dose) over the dose grid and appends the
//! resulting regions to the patient's structure set.

use anyhow::{Context, Result};

use dicom_dictionary_std::tags;
use onco_dicom::access::item_f64;
use onco_dicom::rtss::{Contour, NewRoi};
use onco_dicom::{Dataset, PixelGrid};
use onco_model::{CancellationToken, FileRole, ReasonCode, RoleTable, StepName, StepOutcome};

use crate::calc::geometry::{Mask, trace_boundaries};
use crate::context::PatientContext;
use crate::progress::ProgressSink;
use crate::step::ProcessStep;
use crate::steps::common::write_rtss_output;

pub struct Iso2Roi;

/// Prescription dose from DoseReferenceSequence, in Gy.
fn target_prescription_dose(plan: &Dataset) -> Option<f64> {
    plan.items(tags::DOSE_REFERENCE_SEQUENCE)?
        .iter()
        .find_map(|item| item_f64(item, tags::TARGET_PRESCRIPTION_DOSE))
}

fn level_label(level: f64) -> String {
    if level.fract() == 0.0 {
        format!("ISO_{}", level as i64)
    } else {
        format!("ISO_{level}")
    }
}

/// Boundary contours of one threshold level across all dose-grid frames.
fn level_contours(grid: &PixelGrid, threshold: f64) -> Vec<Contour> {
    let mut contours = Vec::new();
    for frame in 0..grid.frames {
        let Some(values) = grid.frame(frame) else {
            continue;
        };
        let mask = Mask::from_threshold(values, grid.rows, grid.cols, threshold);
        let z = grid.frame_z(frame);
        for boundary in trace_boundaries(&mask) {
            let points = boundary
                .into_iter()
                .map(|(row, col)| {
                    let (x, y) = grid.index_to_point(row, col);
                    [x, y, z]
                })
                .collect();
            contours.push(Contour {
                geometric_type: "CLOSED_PLANAR".to_string(),
                points,
            });
        }
    }
    contours
}

impl ProcessStep for Iso2Roi {
    fn name(&self) -> StepName {
        StepName::Iso2Roi
    }

    fn role_table(&self) -> RoleTable {
        RoleTable::ct_rt()
    }

    fn required_roles(&self) -> &'static [FileRole] {
        &[FileRole::Ct, FileRole::Rtss, FileRole::Rtdose, FileRole::Rtplan]
    }

    fn run(
        &self,
        ctx: &mut PatientContext<'_>,
        cancel: &CancellationToken,
        _progress: &dyn ProgressSink,
    ) -> Result<StepOutcome> {
        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }

        let plan = ctx
            .resolved
            .singleton(FileRole::Rtplan)
            .context("rtplan missing after readiness check")?;
        let Some(rx_dose) = target_prescription_dose(plan) else {
            return Ok(StepOutcome::failure(ReasonCode::IsoNoRxDose));
        };

        let dose = ctx
            .resolved
            .singleton(FileRole::Rtdose)
            .context("rtdose missing after readiness check")?;
        let grid = PixelGrid::from_dose(dose).context("read dose grid")?;

        let mut new_rois = Vec::new();
        for &level in &ctx.config.isodose_levels {
            if cancel.is_set() {
                return Ok(StepOutcome::interrupt());
            }
            let contours = level_contours(&grid, rx_dose * level / 100.0);
            if !contours.is_empty() {
                new_rois.push(NewRoi {
                    name: level_label(level),
                    interpreted_type: "DOSE_REGION".to_string(),
                    contours,
                });
            }
        }

        let current = ctx
            .resolved
            .singleton(FileRole::Rtss)
            .context("rtss missing after readiness check")?;
        let frame_of_reference = current
            .string(tags::FRAME_OF_REFERENCE_UID)
            .unwrap_or_default();
        let mut updated = current.clone();
        onco_dicom::rtss::append_rois(&mut updated, &frame_of_reference, &new_rois);

        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }
        write_rtss_output(ctx, self.name().as_str(), &mut updated)?;
        ctx.resolved.replace_singleton(FileRole::Rtss, updated);
        Ok(StepOutcome::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_labels_drop_trailing_zero() {
        assert_eq!(level_label(90.0), "ISO_90");
        assert_eq!(level_label(97.5), "ISO_97.5");
    }
}
