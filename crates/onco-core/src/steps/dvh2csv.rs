//! DVH export: cumulative dose-volume histogram per ROI, appended to one
//! batch-wide CSV.

use anyhow::{Context, Result};

use onco_dicom::{PixelGrid, rtss};
use onco_model::{CancellationToken, FileRole, ReasonCode, RoleTable, StepName, StepOutcome};

use crate::calc::dvh::cumulative_dvh;
use crate::context::PatientContext;
use crate::csvout::append_rows;
use crate::progress::ProgressSink;
use crate::step::ProcessStep;
use crate::steps::common::{nearest_frame, planar_contour, samples_in_polygon};

pub const DVH_CSV_NAME: &str = "dvh.csv";
const DOSE_BIN_GY: f64 = 0.1;

pub struct Dvh2Csv;

impl ProcessStep for Dvh2Csv {
    fn name(&self) -> StepName {
        StepName::Dvh2Csv
    }

    fn role_table(&self) -> RoleTable {
        RoleTable::ct_rt()
    }

    fn required_roles(&self) -> &'static [FileRole] {
        &[FileRole::Ct, FileRole::Rtss, FileRole::Rtdose]
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
        let dose = ctx
            .resolved
            .singleton(FileRole::Rtdose)
            .context("rtdose missing after readiness check")?;
        let grid = PixelGrid::from_dose(dose).context("read dose grid")?;

        let mut rows = Vec::new();
        for entry in rtss::roi_entries(structure_set) {
            if cancel.is_set() {
                return Ok(StepOutcome::interrupt());
            }
            let mut samples = Vec::new();
            for contour in rtss::contours_for_roi(structure_set, entry.number) {
                if contour.geometric_type != "CLOSED_PLANAR" {
                    return Ok(StepOutcome::failure(ReasonCode::DvhTypeError));
                }
                let Some(planar) = planar_contour(&contour) else {
                    continue;
                };
                let Some(frame) = nearest_frame(&grid, planar.z) else {
                    continue;
                };
                samples.extend(samples_in_polygon(&grid, frame, &planar.vertices));
            }
            for bin in cumulative_dvh(&samples, DOSE_BIN_GY) {
                rows.push(vec![
                    ctx.patient_id.clone(),
                    entry.name.clone(),
                    format!("{:.1}", bin.dose),
                    format!("{:.3}", bin.volume_pct),
                ]);
            }
        }

        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }
        let path = ctx.output_dir.join(self.name().as_str()).join(DVH_CSV_NAME);
        append_rows(
            &path,
            &["patient_id", "roi", "dose_gy", "volume_pct"],
            &rows,
        )
        .context("append DVH rows")?;
        Ok(StepOutcome::success())
    }
}
