//! Subgroup filtering: gates a patient on a clinical-data attribute.

use anyhow::Result;

use onco_model::{CancellationToken, FileRole, ReasonCode, RoleTable, StepName, StepOutcome};

use crate::context::PatientContext;
use crate::progress::ProgressSink;
use crate::step::ProcessStep;
use crate::steps::common::clinical_data_from_sr;

pub struct SelectSubgroup;

impl ProcessStep for SelectSubgroup {
    fn name(&self) -> StepName {
        StepName::SelectSubgroup
    }

    fn role_table(&self) -> RoleTable {
        RoleTable::ct_sr()
    }

    fn required_roles(&self) -> &'static [FileRole] {
        &[FileRole::Sr]
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

        let Some((header, values)) = clinical_data_from_sr(&ctx.resolved) else {
            return Ok(StepOutcome::failure(ReasonCode::CdNoSr));
        };

        // No filter configured: every patient is within the subgroup.
        let Some(filter) = &ctx.config.subgroup else {
            return Ok(StepOutcome::filtered(true));
        };

        let within = header
            .iter()
            .position(|column| column.eq_ignore_ascii_case(&filter.attribute))
            .and_then(|index| values.get(index))
            .is_some_and(|value| {
                filter
                    .values
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(value.trim()))
            });

        Ok(StepOutcome::filtered(within))
    }
}
