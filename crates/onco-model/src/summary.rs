//! Batch summary: the sole user-facing record of a run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::outcome::StepOutcome;
use crate::steps::StepName;

/// Per-patient and batch-level outcomes accumulated over one run.
///
/// Patient entries are created lazily on the first outcome recorded for that
/// patient, so a patient excluded by the subgroup filter before any other
/// stage still gets an entry holding only the filter outcome. The summary is
/// always returned to the caller, including after a run-wide abort, and then
/// contains complete entries for every patient processed before the abort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    patients: BTreeMap<String, BTreeMap<StepName, StepOutcome>>,
    batch: BTreeMap<StepName, StepOutcome>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all accumulated data. Called at run start so an aggregator can
    /// be reused across runs.
    pub fn reset(&mut self) {
        self.patients.clear();
        self.batch.clear();
    }

    pub fn record_patient(&mut self, patient_id: &str, step: StepName, outcome: StepOutcome) {
        self.patients
            .entry(patient_id.to_string())
            .or_default()
            .insert(step, outcome);
    }

    pub fn record_batch(&mut self, step: StepName, outcome: StepOutcome) {
        self.batch.insert(step, outcome);
    }

    pub fn patient(&self, patient_id: &str) -> Option<&BTreeMap<StepName, StepOutcome>> {
        self.patients.get(patient_id)
    }

    pub fn patients(&self) -> impl Iterator<Item = (&str, &BTreeMap<StepName, StepOutcome>)> {
        self.patients.iter().map(|(id, steps)| (id.as_str(), steps))
    }

    pub fn batch_outcomes(&self) -> impl Iterator<Item = (StepName, StepOutcome)> + '_ {
        self.batch.iter().map(|(name, outcome)| (*name, *outcome))
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty() && self.batch.is_empty()
    }

    /// True when any recorded outcome, per-patient or batch-level, failed.
    pub fn has_failures(&self) -> bool {
        self.patients
            .values()
            .flat_map(|steps| steps.values())
            .chain(self.batch.values())
            .any(|outcome| !outcome.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ReasonCode;

    #[test]
    fn patient_entries_are_created_lazily() {
        let mut summary = BatchSummary::new();
        assert!(summary.patient("P1").is_none());
        summary.record_patient("P1", StepName::SelectSubgroup, StepOutcome::filtered(false));
        let entry = summary.patient("P1").unwrap();
        assert_eq!(entry.len(), 1);
        assert!(entry.contains_key(&StepName::SelectSubgroup));
    }

    #[test]
    fn reset_is_idempotent() {
        let mut summary = BatchSummary::new();
        summary.record_patient("P1", StepName::Dvh2Csv, StepOutcome::success());
        summary.record_batch(StepName::KaplanMeier, StepOutcome::success());
        summary.reset();
        assert!(summary.is_empty());
        summary.reset();
        assert!(summary.is_empty());
    }

    #[test]
    fn failures_are_visible() {
        let mut summary = BatchSummary::new();
        summary.record_patient("P1", StepName::Dvh2Csv, StepOutcome::success());
        assert!(!summary.has_failures());
        summary.record_patient(
            "P2",
            StepName::Dvh2Csv,
            StepOutcome::failure(ReasonCode::DvhTypeError),
        );
        assert!(summary.has_failures());
    }

    #[test]
    fn serializes_with_stage_name_keys() {
        let mut summary = BatchSummary::new();
        summary.record_patient("P1", StepName::Dvh2Csv, StepOutcome::success());
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"dvh2csv\""));
        assert!(json.contains("\"SUCCESS\""));
    }
}
