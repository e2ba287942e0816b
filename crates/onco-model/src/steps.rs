//! Stage names and the reserved batch-level subset.
//!
//! Stage configuration arrives as an ordered list of name strings; parsing
//! into this closed enum makes unknown names a caller error up front and
//! lets the orchestrator enumerate the reserved batch-level set with an
//! exhaustive match instead of a string set.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Every stage the batch engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepName {
    SelectSubgroup,
    Iso2Roi,
    Suv2Roi,
    Dvh2Csv,
    Pyrad2Csv,
    ClinicalData2Csv,
    Csv2ClinicalDataSr,
    RoiName2FmaId,
    Fma2RoiName,
    RoiNameCleaning,
    MachineLearning,
    MachineLearningDataSelection,
    KaplanMeier,
}

impl StepName {
    /// The configuration string for this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::SelectSubgroup => "select_subgroup",
            StepName::Iso2Roi => "iso2roi",
            StepName::Suv2Roi => "suv2roi",
            StepName::Dvh2Csv => "dvh2csv",
            StepName::Pyrad2Csv => "pyrad2csv",
            StepName::ClinicalData2Csv => "clinicaldata2csv",
            StepName::Csv2ClinicalDataSr => "csv2clinicaldatasr",
            StepName::RoiName2FmaId => "roiname2fmaid",
            StepName::Fma2RoiName => "fma2roiname",
            StepName::RoiNameCleaning => "roi name cleaning",
            StepName::MachineLearning => "machine learning",
            StepName::MachineLearningDataSelection => "machine learning data selection",
            StepName::KaplanMeier => "kaplan-meier",
        }
    }

    /// Stages in the reserved batch-level set run exactly once after all
    /// patients; they are deferred out of the per-patient loop.
    pub fn is_batch_level(&self) -> bool {
        match self {
            StepName::RoiNameCleaning
            | StepName::MachineLearning
            | StepName::MachineLearningDataSelection
            | StepName::KaplanMeier => true,
            StepName::SelectSubgroup
            | StepName::Iso2Roi
            | StepName::Suv2Roi
            | StepName::Dvh2Csv
            | StepName::Pyrad2Csv
            | StepName::ClinicalData2Csv
            | StepName::Csv2ClinicalDataSr
            | StepName::RoiName2FmaId
            | StepName::Fma2RoiName => false,
        }
    }

    /// The gating stage runs first for each patient and decides whether the
    /// remaining per-patient stages run at all.
    pub fn is_gating(&self) -> bool {
        matches!(self, StepName::SelectSubgroup)
    }

    pub fn all() -> &'static [StepName] {
        &[
            StepName::SelectSubgroup,
            StepName::Iso2Roi,
            StepName::Suv2Roi,
            StepName::Dvh2Csv,
            StepName::Pyrad2Csv,
            StepName::ClinicalData2Csv,
            StepName::Csv2ClinicalDataSr,
            StepName::RoiName2FmaId,
            StepName::Fma2RoiName,
            StepName::RoiNameCleaning,
            StepName::MachineLearning,
            StepName::MachineLearningDataSelection,
            StepName::KaplanMeier,
        ]
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        StepName::all()
            .iter()
            .find(|name| name.as_str() == value)
            .copied()
            .ok_or_else(|| ModelError::UnknownStepName(value.to_string()))
    }
}

impl Serialize for StepName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StepName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in StepName::all() {
            assert_eq!(name.as_str().parse::<StepName>().unwrap(), *name);
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!("dvh2xlsx".parse::<StepName>().is_err());
    }

    #[test]
    fn reserved_batch_level_set() {
        let batch: Vec<_> = StepName::all()
            .iter()
            .filter(|n| n.is_batch_level())
            .map(|n| n.as_str())
            .collect();
        assert_eq!(
            batch,
            vec![
                "roi name cleaning",
                "machine learning",
                "machine learning data selection",
                "kaplan-meier",
            ]
        );
    }

    #[test]
    fn only_select_subgroup_gates() {
        for name in StepName::all() {
            assert_eq!(name.is_gating(), name.as_str() == "select_subgroup");
        }
    }

    #[test]
    fn serializes_as_configuration_string() {
        let json = serde_json::to_string(&StepName::KaplanMeier).unwrap();
        assert_eq!(json, "\"kaplan-meier\"");
        let back: StepName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StepName::KaplanMeier);
    }
}
