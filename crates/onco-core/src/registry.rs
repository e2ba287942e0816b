//! The fixed stage registry.
//!
//! Maps every stage name to its tagged handler. The per-patient /
//! batch-level split is carried by the handler kind, so the orchestrator
//! can defer the reserved batch-level set without string matching.

use std::collections::BTreeMap;

use onco_model::{RoleTable, StepName};

use crate::step::{BatchStep, ProcessStep};
use crate::steps;

pub enum StepHandler {
    PerPatient(Box<dyn ProcessStep>),
    BatchLevel(Box<dyn BatchStep>),
}

pub struct StepRegistry {
    handlers: BTreeMap<StepName, StepHandler>,
}

impl StepRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// The standard registry with every known stage.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register_per_patient(Box::new(steps::SelectSubgroup));
        registry.register_per_patient(Box::new(steps::Iso2Roi));
        registry.register_per_patient(Box::new(steps::Suv2Roi));
        registry.register_per_patient(Box::new(steps::Dvh2Csv));
        registry.register_per_patient(Box::new(steps::Pyrad2Csv));
        registry.register_per_patient(Box::new(steps::ClinicalData2Csv));
        registry.register_per_patient(Box::new(steps::Csv2ClinicalDataSr));
        registry.register_per_patient(Box::new(steps::RoiName2FmaId));
        registry.register_per_patient(Box::new(steps::Fma2RoiName));
        registry.register_batch_level(StepName::RoiNameCleaning, Box::new(steps::RoiNameCleaning));
        registry.register_batch_level(StepName::MachineLearning, Box::new(steps::MachineLearning));
        registry.register_batch_level(
            StepName::MachineLearningDataSelection,
            Box::new(steps::MachineLearningDataSelection),
        );
        registry.register_batch_level(StepName::KaplanMeier, Box::new(steps::KaplanMeier));
        registry
    }

    pub fn register_per_patient(&mut self, step: Box<dyn ProcessStep>) {
        self.handlers
            .insert(step.name(), StepHandler::PerPatient(step));
    }

    pub fn register_batch_level(&mut self, name: StepName, step: Box<dyn BatchStep>) {
        self.handlers.insert(name, StepHandler::BatchLevel(step));
    }

    pub fn get(&self, name: StepName) -> Option<&StepHandler> {
        self.handlers.get(&name)
    }

    pub fn per_patient(&self, name: StepName) -> Option<&dyn ProcessStep> {
        match self.handlers.get(&name) {
            Some(StepHandler::PerPatient(step)) => Some(step.as_ref()),
            _ => None,
        }
    }

    pub fn batch_level(&self, name: StepName) -> Option<&dyn BatchStep> {
        match self.handlers.get(&name) {
            Some(StepHandler::BatchLevel(step)) => Some(step.as_ref()),
            _ => None,
        }
    }

    /// Union of the configured per-patient stages' role tables; the table
    /// one patient's bag is resolved against.
    pub fn union_role_table(&self, stages: &[StepName]) -> RoleTable {
        let mut table = RoleTable::new();
        for stage in stages {
            if let Some(step) = self.per_patient(*stage) {
                table.merge(&step.role_table());
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_every_stage() {
        let registry = StepRegistry::standard();
        for name in StepName::all() {
            assert!(registry.get(*name).is_some(), "missing handler for {name}");
        }
    }

    #[test]
    fn handler_kind_matches_the_reserved_set() {
        let registry = StepRegistry::standard();
        for name in StepName::all() {
            match registry.get(*name).unwrap() {
                StepHandler::PerPatient(_) => assert!(!name.is_batch_level()),
                StepHandler::BatchLevel(_) => assert!(name.is_batch_level()),
            }
        }
    }

    #[test]
    fn union_table_folds_stage_tables() {
        let registry = StepRegistry::standard();
        let table = registry.union_role_table(&[StepName::Dvh2Csv, StepName::Suv2Roi]);
        assert!(table.lookup(onco_model::sop_class::CT_IMAGE).is_some());
        assert!(table.lookup(onco_model::sop_class::PET_IMAGE).is_some());
        assert!(table.lookup(onco_model::sop_class::RT_DOSE).is_some());
    }

    #[test]
    fn union_table_ignores_batch_level_stages() {
        let registry = StepRegistry::standard();
        let table = registry.union_role_table(&[StepName::KaplanMeier]);
        assert!(table.is_empty());
    }
}
