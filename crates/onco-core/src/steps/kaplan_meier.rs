//! Batch-level Kaplan-Meier survival export.

use anyhow::{Context, Result};

use onco_model::{CancellationToken, ReasonCode, StepName, StepOutcome};

use crate::calc::survival::product_limit;
use crate::context::BatchContext;
use crate::csvout::{append_rows, column_index, read_rows};
use crate::progress::ProgressSink;
use crate::step::BatchStep;
use crate::steps::clinical::CLINICAL_CSV_NAME;

pub struct KaplanMeier;

impl BatchStep for KaplanMeier {
    fn name(&self) -> StepName {
        StepName::KaplanMeier
    }

    fn run(
        &self,
        ctx: &BatchContext<'_>,
        cancel: &CancellationToken,
        _progress: &dyn ProgressSink,
    ) -> Result<StepOutcome> {
        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }

        let source = ctx
            .output_dir
            .join(StepName::ClinicalData2Csv.as_str())
            .join(CLINICAL_CSV_NAME);
        let Ok((header, rows)) = read_rows(&source) else {
            return Ok(StepOutcome::failure(ReasonCode::KmNoData));
        };

        let Some(duration_index) = column_index(&header, &ctx.config.km_duration_column) else {
            return Ok(StepOutcome::failure(ReasonCode::KmNoData));
        };
        let Some(event_index) = column_index(&header, &ctx.config.km_event_column) else {
            return Ok(StepOutcome::failure(ReasonCode::KmNoData));
        };

        let observations: Vec<(f64, bool)> = rows
            .iter()
            .filter_map(|row| {
                let duration: f64 = row.get(duration_index)?.trim().parse().ok()?;
                let event = matches!(
                    row.get(event_index)?.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "y"
                );
                Some((duration, event))
            })
            .collect();
        let curve = product_limit(&observations);
        if curve.is_empty() {
            return Ok(StepOutcome::failure(ReasonCode::KmNoData));
        }

        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }
        let path = ctx.step_output_dir(self.name().as_str()).join("survival.csv");
        let survival_rows: Vec<Vec<String>> = curve
            .iter()
            .map(|point| {
                vec![
                    format!("{}", point.time),
                    point.at_risk.to_string(),
                    point.events.to_string(),
                    format!("{:.6}", point.survival),
                ]
            })
            .collect();
        append_rows(
            &path,
            &["time", "at_risk", "events", "survival"],
            &survival_rows,
        )
        .context("write survival curve")?;
        Ok(StepOutcome::success())
    }
}
