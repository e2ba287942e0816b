//! Run configuration.
//!
//! The caller supplies an ordered stage list plus per-step options as one
//! JSON document. Unknown stage names fail at parse time; they are a caller
//! error, not a runtime branch.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use onco_model::StepName;

/// Subgroup filter: keep patients whose clinical-data attribute takes one
/// of the listed values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubgroupFilter {
    pub attribute: String,
    pub values: Vec<String>,
}

/// One ROI name-cleaning edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RoiNameChange {
    Rename { from: String, to: String },
    Delete { from: String },
}

impl RoiNameChange {
    pub fn from_name(&self) -> &str {
        match self {
            RoiNameChange::Rename { from, .. } | RoiNameChange::Delete { from } => from,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Ordered stage list; order is authoritative for non-gating stages.
    pub stages: Vec<StepName>,

    #[serde(default)]
    pub subgroup: Option<SubgroupFilter>,

    /// Isodose levels as percentages of the prescription dose.
    #[serde(default = "default_isodose_levels")]
    pub isodose_levels: Vec<f64>,

    /// SUV thresholds (g/ml) for PET-driven ROI generation.
    #[serde(default = "default_suv_thresholds")]
    pub suv_thresholds: Vec<f64>,

    /// Clinical-data CSV consumed by `csv2clinicaldatasr`.
    #[serde(default)]
    pub clinical_data_csv: Option<PathBuf>,

    /// ROI name-cleaning edits keyed by patient id; `"*"` applies to every
    /// patient.
    #[serde(default)]
    pub roi_name_cleaning: BTreeMap<String, Vec<RoiNameChange>>,

    /// Feature columns selected for the model-input dataset.
    #[serde(default)]
    pub ml_features: Vec<String>,

    /// Binary target column for model training.
    #[serde(default)]
    pub ml_target: Option<String>,

    /// Survival columns for the Kaplan-Meier estimate.
    #[serde(default = "default_km_duration")]
    pub km_duration_column: String,
    #[serde(default = "default_km_event")]
    pub km_event_column: String,
}

fn default_isodose_levels() -> Vec<f64> {
    vec![10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 100.0]
}

fn default_suv_thresholds() -> Vec<f64> {
    vec![3.0]
}

fn default_km_duration() -> String {
    "duration".to_string()
}

fn default_km_event() -> String {
    "event".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            subgroup: None,
            isodose_levels: default_isodose_levels(),
            suv_thresholds: default_suv_thresholds(),
            clinical_data_csv: None,
            roi_name_cleaning: BTreeMap::new(),
            ml_features: Vec::new(),
            ml_target: None,
            km_duration_column: default_km_duration(),
            km_event_column: default_km_event(),
        }
    }
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read run configuration {}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parse run configuration {}", path.display()))?;
        Ok(config)
    }

    pub fn cleaning_changes_for(&self, patient_id: &str) -> Vec<&RoiNameChange> {
        let mut changes = Vec::new();
        if let Some(shared) = self.roi_name_cleaning.get("*") {
            changes.extend(shared.iter());
        }
        if let Some(own) = self.roi_name_cleaning.get(patient_id) {
            changes.extend(own.iter());
        }
        changes
    }
}
