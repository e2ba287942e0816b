//! Radiomics export: first-order features per ROI over the image stack,
//! appended to one batch-wide CSV.

use anyhow::{Context, Result};

use dicom_dictionary_std::tags;
use onco_dicom::{PixelGrid, rtss};
use onco_model::{CancellationToken, FileRole, ReasonCode, RoleTable, StepName, StepOutcome};

use crate::calc::stats::FirstOrderStats;
use crate::context::PatientContext;
use crate::csvout::append_rows;
use crate::progress::ProgressSink;
use crate::step::ProcessStep;
use crate::steps::common::{nearest_slice, planar_contour, samples_in_polygon};

pub const RADIOMICS_CSV_NAME: &str = "radiomics.csv";

pub struct Pyrad2Csv;

impl ProcessStep for Pyrad2Csv {
    fn name(&self) -> StepName {
        StepName::Pyrad2Csv
    }

    fn role_table(&self) -> RoleTable {
        RoleTable::ct_rt()
    }

    fn required_roles(&self) -> &'static [FileRole] {
        &[FileRole::Ct, FileRole::Rtss]
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

        let structure_set = ctx
            .resolved
            .singleton(FileRole::Rtss)
            .context("rtss missing after readiness check")?;
        let slices = ctx
            .resolved
            .slices(FileRole::Ct)
            .context("image stack missing after readiness check")?;

        let mut rows = Vec::new();
        for entry in rtss::roi_entries(structure_set) {
            if cancel.is_set() {
                return Ok(StepOutcome::interrupt());
            }
            let mut samples = Vec::new();
            let mut voxel_volume_mm3 = 0.0;
            for contour in rtss::contours_for_roi(structure_set, entry.number) {
                let Some(planar) = planar_contour(&contour) else {
                    continue;
                };
                let Some(slice) = nearest_slice(slices, planar.z) else {
                    continue;
                };
                let grid = PixelGrid::from_image(slice).context("read image slice")?;
                if voxel_volume_mm3 == 0.0 {
                    let thickness = slice.f64(tags::SLICE_THICKNESS).unwrap_or(1.0);
                    voxel_volume_mm3 = grid.spacing[0] * grid.spacing[1] * thickness;
                }
                samples.extend(samples_in_polygon(&grid, 0, &planar.vertices));
            }
            let Some(stats) = FirstOrderStats::from_samples(&samples) else {
                continue;
            };
            let volume_cc = stats.count as f64 * voxel_volume_mm3 / 1000.0;
            rows.push(vec![
                ctx.patient_id.clone(),
                entry.name.clone(),
                stats.count.to_string(),
                format!("{:.4}", stats.mean),
                format!("{:.4}", stats.std_dev),
                format!("{:.4}", stats.min),
                format!("{:.4}", stats.max),
                format!("{:.4}", stats.median),
                format!("{:.4}", stats.energy),
                format!("{:.4}", stats.entropy),
                format!("{:.4}", volume_cc),
            ]);
        }

        if rows.is_empty() {
            return Ok(StepOutcome::failure(ReasonCode::PyradNoDf));
        }

        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }
        let path = ctx
            .output_dir
            .join(self.name().as_str())
            .join(RADIOMICS_CSV_NAME);
        append_rows(
            &path,
            &[
                "patient_id",
                "roi",
                "voxels",
                "mean",
                "std_dev",
                "min",
                "max",
                "median",
                "energy",
                "entropy",
                "volume_cc",
            ],
            &rows,
        )
        .context("append radiomics rows")?;
        Ok(StepOutcome::success())
    }
}
