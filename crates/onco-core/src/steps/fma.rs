//! ROI renaming between standard organ names and FMA identifiers.

use std::collections::BTreeMap;

use anyhow::Result;

use onco_dicom::rtss;
use onco_model::{CancellationToken, FileRole, ReasonCode, RoleTable, StepName, StepOutcome};

use crate::context::PatientContext;
use crate::progress::ProgressSink;
use crate::step::ProcessStep;
use crate::steps::common::write_rtss_output;

/// Standard organ name ↔ Foundational Model of Anatomy identifier.
const FMA_TABLE: &[(&str, &str)] = &[
    ("Bladder", "FMA15900"),
    ("Brain", "FMA50801"),
    ("Brainstem", "FMA79876"),
    ("Esophagus", "FMA7131"),
    ("Heart", "FMA7088"),
    ("Kidney_L", "FMA7204"),
    ("Kidney_R", "FMA7203"),
    ("Liver", "FMA7197"),
    ("Lung_L", "FMA7310"),
    ("Lung_R", "FMA7309"),
    ("Mandible", "FMA52748"),
    ("Parotid_L", "FMA59798"),
    ("Parotid_R", "FMA59797"),
    ("SpinalCord", "FMA7647"),
    ("Spleen", "FMA7196"),
    ("Stomach", "FMA7148"),
    ("Thyroid", "FMA9603"),
    ("Trachea", "FMA7394"),
];

fn name_to_fma(name: &str) -> Option<&'static str> {
    FMA_TABLE
        .iter()
        .find(|(standard, _)| standard.eq_ignore_ascii_case(name))
        .map(|(_, fma)| *fma)
}

fn fma_to_name(fma: &str) -> Option<&'static str> {
    FMA_TABLE
        .iter()
        .find(|(_, id)| id.eq_ignore_ascii_case(fma))
        .map(|(standard, _)| *standard)
}

fn rename_step(
    ctx: &mut PatientContext<'_>,
    cancel: &CancellationToken,
    step: StepName,
    no_match: ReasonCode,
    map: impl Fn(&str) -> Option<&'static str>,
) -> Result<StepOutcome> {
    if cancel.is_set() {
        return Ok(StepOutcome::interrupt());
    }

    let Some(current) = ctx.resolved.singleton(FileRole::Rtss) else {
        return Ok(StepOutcome::failure(ReasonCode::Skip));
    };

    let renames: BTreeMap<String, String> = rtss::roi_entries(current)
        .into_iter()
        .filter_map(|entry| {
            map(&entry.name).map(|target| (entry.name, target.to_string()))
        })
        .collect();
    if renames.is_empty() {
        return Ok(StepOutcome::failure(no_match));
    }

    let mut updated = current.clone();
    rtss::rename_rois(&mut updated, &renames);

    if cancel.is_set() {
        return Ok(StepOutcome::interrupt());
    }
    write_rtss_output(ctx, step.as_str(), &mut updated)?;
    ctx.resolved.replace_singleton(FileRole::Rtss, updated);
    Ok(StepOutcome::success())
}

pub struct RoiName2FmaId;

impl ProcessStep for RoiName2FmaId {
    fn name(&self) -> StepName {
        StepName::RoiName2FmaId
    }

    fn role_table(&self) -> RoleTable {
        RoleTable::ct_rt()
    }

    fn required_roles(&self) -> &'static [FileRole] {
        &[FileRole::Rtss]
    }

    fn run(
        &self,
        ctx: &mut PatientContext<'_>,
        cancel: &CancellationToken,
        _progress: &dyn ProgressSink,
    ) -> Result<StepOutcome> {
        rename_step(ctx, cancel, self.name(), ReasonCode::RoiNoFma, name_to_fma)
    }
}

pub struct Fma2RoiName;

impl ProcessStep for Fma2RoiName {
    fn name(&self) -> StepName {
        StepName::Fma2RoiName
    }

    fn role_table(&self) -> RoleTable {
        RoleTable::ct_rt()
    }

    fn required_roles(&self) -> &'static [FileRole] {
        &[FileRole::Rtss]
    }

    fn run(
        &self,
        ctx: &mut PatientContext<'_>,
        cancel: &CancellationToken,
        _progress: &dyn ProgressSink,
    ) -> Result<StepOutcome> {
        rename_step(ctx, cancel, self.name(), ReasonCode::FmaNoRoi, fma_to_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_maps_both_directions() {
        assert_eq!(name_to_fma("Heart"), Some("FMA7088"));
        assert_eq!(name_to_fma("heart"), Some("FMA7088"));
        assert_eq!(fma_to_name("FMA7310"), Some("Lung_L"));
        assert_eq!(name_to_fma("NotAnOrgan"), None);
    }
}
