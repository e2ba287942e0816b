//! Machine-learning stages: dataset selection and model training.
//!
//! Both operate on the aggregated CSV outputs of the per-patient stages,
//! once, after the patient loop.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use onco_model::{CancellationToken, ReasonCode, StepName, StepOutcome};

use crate::calc::logistic;
use crate::context::BatchContext;
use crate::csvout::{append_rows, column_index, read_rows};
use crate::progress::ProgressSink;
use crate::step::BatchStep;
use crate::steps::clinical::CLINICAL_CSV_NAME;

pub const ML_DATASET_NAME: &str = "dataset.csv";
const TRAIN_EPOCHS: usize = 300;
const LEARNING_RATE: f64 = 0.1;

fn clinical_csv_path(ctx: &BatchContext<'_>) -> PathBuf {
    ctx.output_dir
        .join(StepName::ClinicalData2Csv.as_str())
        .join(CLINICAL_CSV_NAME)
}

fn dataset_path(ctx: &BatchContext<'_>) -> PathBuf {
    ctx.step_output_dir(StepName::MachineLearningDataSelection.as_str())
        .join(ML_DATASET_NAME)
}

pub struct MachineLearningDataSelection;

impl BatchStep for MachineLearningDataSelection {
    fn name(&self) -> StepName {
        StepName::MachineLearningDataSelection
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

        let source = clinical_csv_path(ctx);
        let Ok((header, rows)) = read_rows(&source) else {
            return Ok(StepOutcome::failure(ReasonCode::MldsNoInput));
        };

        let id_index = column_index(&header, "patient_id").unwrap_or(0);
        let target = ctx.config.ml_target.as_deref();

        // Selected feature columns: the configured list, or every column
        // that is neither the id nor the target.
        let selected: Vec<usize> = if ctx.config.ml_features.is_empty() {
            header
                .iter()
                .enumerate()
                .filter(|(i, name)| {
                    *i != id_index && target.is_none_or(|t| !name.eq_ignore_ascii_case(t))
                })
                .map(|(i, _)| i)
                .collect()
        } else {
            ctx.config
                .ml_features
                .iter()
                .filter_map(|name| column_index(&header, name))
                .collect()
        };
        let target_index = target.and_then(|name| column_index(&header, name));
        if selected.is_empty() {
            return Ok(StepOutcome::failure(ReasonCode::MldsNoInput));
        }

        let mut out_header = vec!["patient_id".to_string()];
        out_header.extend(selected.iter().map(|&i| header[i].clone()));
        if let Some(t) = target_index {
            out_header.push(header[t].clone());
        }

        let mut out_rows = Vec::new();
        for row in &rows {
            let mut out_row = vec![row.get(id_index).cloned().unwrap_or_default()];
            let mut complete = true;
            for &i in &selected {
                match row.get(i) {
                    Some(value) if !value.trim().is_empty() => out_row.push(value.clone()),
                    _ => {
                        complete = false;
                        break;
                    }
                }
            }
            if let Some(t) = target_index {
                match row.get(t) {
                    Some(value) if !value.trim().is_empty() => out_row.push(value.clone()),
                    _ => complete = false,
                }
            }
            if complete {
                out_rows.push(out_row);
            }
        }
        if out_rows.is_empty() {
            return Ok(StepOutcome::failure(ReasonCode::MldsNoInput));
        }

        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }
        let path = dataset_path(ctx);
        let header_refs: Vec<&str> = out_header.iter().map(String::as_str).collect();
        append_rows(&path, &header_refs, &out_rows).context("write model-input dataset")?;
        info!(rows = out_rows.len(), "model-input dataset written");
        Ok(StepOutcome::success())
    }
}

pub struct MachineLearning;

impl BatchStep for MachineLearning {
    fn name(&self) -> StepName {
        StepName::MachineLearning
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

        // Prefer the selected dataset; fall back to the raw clinical CSV.
        let source = {
            let selected = dataset_path(ctx);
            if selected.exists() {
                selected
            } else {
                clinical_csv_path(ctx)
            }
        };
        let Ok((header, rows)) = read_rows(&source) else {
            return Ok(StepOutcome::failure(ReasonCode::MlNoData));
        };

        let id_index = column_index(&header, "patient_id").unwrap_or(0);
        let target_index = match ctx
            .config
            .ml_target
            .as_deref()
            .and_then(|name| column_index(&header, name))
        {
            Some(index) => index,
            // Last column by convention when no target is configured.
            None if header.len() > 1 => header.len() - 1,
            None => return Ok(StepOutcome::failure(ReasonCode::MlNoData)),
        };

        let feature_indices: Vec<usize> = (0..header.len())
            .filter(|&i| i != id_index && i != target_index)
            .collect();
        if feature_indices.is_empty() {
            return Ok(StepOutcome::failure(ReasonCode::MlNoData));
        }
        let feature_names: Vec<String> =
            feature_indices.iter().map(|&i| header[i].clone()).collect();

        let mut features = Vec::new();
        let mut labels = Vec::new();
        for row in &rows {
            let Some(label) = row.get(target_index).and_then(|v| parse_label(v)) else {
                continue;
            };
            let values: Option<Vec<f64>> = feature_indices
                .iter()
                .map(|&i| row.get(i).and_then(|v| v.trim().parse::<f64>().ok()))
                .collect();
            if let Some(values) = values {
                features.push(values);
                labels.push(label);
            }
        }

        let Some(model) =
            logistic::train(&feature_names, &features, &labels, TRAIN_EPOCHS, LEARNING_RATE)
        else {
            return Ok(StepOutcome::failure(ReasonCode::MlNoData));
        };

        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }
        let dir = ctx.step_output_dir(self.name().as_str());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create step output directory {}", dir.display()))?;
        let path = dir.join("model.json");
        let json = serde_json::to_string_pretty(&model).context("serialize model")?;
        std::fs::write(&path, json).with_context(|| format!("write model {}", path.display()))?;
        info!(
            accuracy = model.train_accuracy,
            samples = labels.len(),
            "model trained"
        );
        Ok(StepOutcome::success())
    }
}

fn parse_label(raw: &str) -> Option<f64> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(1.0),
        "0" | "false" | "no" | "n" => Some(0.0),
        other => {
            let value: f64 = other.parse().ok()?;
            if value == 0.0 || value == 1.0 {
                Some(value)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_common_encodings() {
        assert_eq!(parse_label("1"), Some(1.0));
        assert_eq!(parse_label("Yes"), Some(1.0));
        assert_eq!(parse_label("false"), Some(0.0));
        assert_eq!(parse_label("2"), None);
        assert_eq!(parse_label("maybe"), None);
    }
}
