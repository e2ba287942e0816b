//! Job-scoped contexts handed to steps.
//!
//! The patient context is constructed per patient and passed by reference
//! into every stage call; it owns the patient's resolved set for its
//! lifetime and is dropped whole before the next patient's resolution
//! begins. Nothing here is process-wide.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use onco_ingest::ResolvedFileSet;

use crate::config::RunConfig;

/// Values stages pass to each other within a run (pixel lookup tables, ROI
/// dictionaries, parsed clinical rows). Cleared once per completed or
/// aborted run.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Text(String),
    Number(f64),
    TextList(Vec<String>),
    Table(Vec<Vec<String>>),
}

#[derive(Debug, Default)]
pub struct ValueCache {
    map: HashMap<String, CacheValue>,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CacheValue> {
        self.map.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: CacheValue) {
        self.map.insert(key.into(), value);
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Everything a per-patient step sees.
pub struct PatientContext<'run> {
    pub patient_id: String,
    /// The one resolved set resident at a time; steps read and may write it
    /// directly (the `rtss` entry is the only cross-step channel besides
    /// the summary).
    pub resolved: ResolvedFileSet,
    pub cache: &'run mut ValueCache,
    pub output_dir: &'run Path,
    pub config: &'run RunConfig,
}

impl<'run> PatientContext<'run> {
    pub fn new(
        resolved: ResolvedFileSet,
        cache: &'run mut ValueCache,
        output_dir: &'run Path,
        config: &'run RunConfig,
    ) -> Self {
        Self {
            patient_id: resolved.patient_id().to_string(),
            resolved,
            cache,
            output_dir,
            config,
        }
    }

    /// Output directory for one step's side effects, attributed to the step
    /// name for traceability.
    pub fn step_output_dir(&self, step: &str) -> PathBuf {
        self.output_dir.join(&self.patient_id).join(step)
    }
}

/// Everything a batch-level step sees; built once after the patient loop.
pub struct BatchContext<'run> {
    pub patients: &'run [onco_model::PatientRecord],
    pub output_dir: &'run Path,
    pub config: &'run RunConfig,
}

impl BatchContext<'_> {
    pub fn step_output_dir(&self, step: &str) -> PathBuf {
        self.output_dir.join(step.replace(' ', "_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_round_trips_and_clears() {
        let mut cache = ValueCache::new();
        cache.set("roi_names", CacheValue::TextList(vec!["PTV".into()]));
        assert_eq!(
            cache.get("roi_names"),
            Some(&CacheValue::TextList(vec!["PTV".into()]))
        );
        cache.clear();
        assert!(cache.is_empty());
    }
}
