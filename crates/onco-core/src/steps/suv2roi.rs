//! SUV-to-ROI conversion over a PET series.
//!
//! Scales each PET slice to body-weight SUV (decay-corrected when the
//! radiopharmaceutical data allows it), thresholds at the configured
//! levels, and builds a fresh structure set referencing the PET series.

use anyhow::{Context, Result};

use dicom_dictionary_std::tags;
use onco_dicom::access::{item_f64, item_str};
use onco_dicom::rtss::{Contour, NewRoi};
use onco_dicom::{Dataset, PixelGrid, rtss};
use onco_model::{CancellationToken, FileRole, ReasonCode, RoleTable, StepName, StepOutcome};

use crate::calc::geometry::{Mask, trace_boundaries};
use crate::calc::suv::{decay_corrected_dose, parse_dicom_time, suv_factor};
use crate::context::PatientContext;
use crate::progress::ProgressSink;
use crate::step::ProcessStep;
use crate::steps::common::write_rtss_output;

pub struct Suv2Roi;

/// Bq/ml → SUVbw factor for this series, or `None` when the SUV inputs
/// (patient weight, injected dose) are absent.
fn series_suv_factor(first_slice: &Dataset) -> Option<f64> {
    let weight_kg = first_slice.f64(tags::PATIENT_WEIGHT)?;

    let info = first_slice
        .items(tags::RADIOPHARMACEUTICAL_INFORMATION_SEQUENCE)?
        .first()?;
    let total_dose = item_f64(info, tags::RADIONUCLIDE_TOTAL_DOSE)?;

    let decayed = match (
        item_f64(info, tags::RADIONUCLIDE_HALF_LIFE),
        item_str(info, tags::RADIOPHARMACEUTICAL_START_TIME).and_then(|t| parse_dicom_time(&t)),
        first_slice
            .string(tags::ACQUISITION_TIME)
            .or_else(|| first_slice.string(tags::SERIES_TIME))
            .and_then(|t| parse_dicom_time(&t)),
    ) {
        (Some(half_life), Some(injection), Some(acquisition)) => {
            decay_corrected_dose(total_dose, half_life, injection, acquisition)
        }
        _ => total_dose,
    };

    suv_factor(weight_kg, decayed)
}

fn threshold_label(threshold: f64) -> String {
    if threshold.fract() == 0.0 {
        format!("SUV_{}", threshold as i64)
    } else {
        format!("SUV_{threshold}")
    }
}

impl ProcessStep for Suv2Roi {
    fn name(&self) -> StepName {
        StepName::Suv2Roi
    }

    fn role_table(&self) -> RoleTable {
        RoleTable::pet()
    }

    fn required_roles(&self) -> &'static [FileRole] {
        &[FileRole::Pet]
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

        let slices = ctx
            .resolved
            .slices(FileRole::Pet)
            .context("pet series missing after readiness check")?;
        let first = slices.first().context("pet series is empty")?;
        let Some(factor) = series_suv_factor(first) else {
            return Ok(StepOutcome::failure(ReasonCode::SuvNoWeight));
        };

        let mut rois: Vec<NewRoi> = ctx
            .config
            .suv_thresholds
            .iter()
            .map(|&threshold| NewRoi {
                name: threshold_label(threshold),
                interpreted_type: "GTV".to_string(),
                contours: Vec::new(),
            })
            .collect();

        for slice in slices {
            if cancel.is_set() {
                return Ok(StepOutcome::interrupt());
            }
            let grid = PixelGrid::from_image(slice).context("read pet slice")?;
            let Some(values) = grid.frame(0) else {
                continue;
            };
            let suv: Vec<f64> = values.iter().map(|v| v * factor).collect();
            let z = slice.slice_position().unwrap_or(0.0);
            for (roi, &threshold) in rois.iter_mut().zip(&ctx.config.suv_thresholds) {
                let mask = Mask::from_threshold(&suv, grid.rows, grid.cols, threshold);
                for boundary in trace_boundaries(&mask) {
                    let points = boundary
                        .into_iter()
                        .map(|(row, col)| {
                            let (x, y) = grid.index_to_point(row, col);
                            [x, y, z]
                        })
                        .collect();
                    roi.contours.push(Contour {
                        geometric_type: "CLOSED_PLANAR".to_string(),
                        points,
                    });
                }
            }
        }
        rois.retain(|roi| !roi.contours.is_empty());

        let frame_of_reference = first
            .string(tags::FRAME_OF_REFERENCE_UID)
            .unwrap_or_default();
        let study_uid = first.string(tags::STUDY_INSTANCE_UID).unwrap_or_default();
        let series_uid = first.series_instance_uid().unwrap_or_default();
        let mut generated = rtss::new_rtss(
            &ctx.patient_id,
            &frame_of_reference,
            &study_uid,
            &series_uid,
            "SUV regions",
        );
        rtss::append_rois(&mut generated, &frame_of_reference, &rois);

        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }
        write_rtss_output(ctx, self.name().as_str(), &mut generated)?;
        ctx.resolved.replace_singleton(FileRole::Rtss, generated);
        Ok(StepOutcome::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_labels() {
        assert_eq!(threshold_label(3.0), "SUV_3");
        assert_eq!(threshold_label(2.5), "SUV_2.5");
    }
}
