//! Step outcomes and the closed reason-code vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a step finished the way it did.
///
/// Expected failure modes never raise; they are always reported through one
/// of these codes. The rendered strings are stable and part of the summary
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    Success,
    /// A required role was missing from the resolved set.
    Skip,
    /// The run-wide cancellation token was observed.
    Interrupt,
    /// RTPLAN carries no target prescription dose.
    IsoNoRxDose,
    /// PET data lacks the SUV inputs (patient weight, injected dose).
    SuvNoWeight,
    /// No clinical-data structured report resolved for this patient.
    CdNoSr,
    /// The configured clinical-data CSV does not exist or is unreadable.
    CdNoCsv,
    /// The clinical-data CSV has no row for this patient.
    CdNoPatient,
    /// An ROI's contour geometry cannot be histogrammed.
    DvhTypeError,
    /// Radiomics extraction produced no feature rows.
    PyradNoDf,
    /// No ROI name matched the FMA lookup.
    RoiNoFma,
    /// No FMA-identified ROI present to rename back.
    FmaNoRoi,
    /// The model-input dataset is empty or degenerate.
    MlNoData,
    /// No per-patient CSV outputs available to select from.
    MldsNoInput,
    /// Survival columns missing or empty across the batch.
    KmNoData,
    /// No ROI name-cleaning map supplied for any dataset.
    RoiCleanNoMap,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Success => "SUCCESS",
            ReasonCode::Skip => "SKIP",
            ReasonCode::Interrupt => "INTERRUPT",
            ReasonCode::IsoNoRxDose => "ISO_NO_RX_DOSE",
            ReasonCode::SuvNoWeight => "SUV_NO_WEIGHT",
            ReasonCode::CdNoSr => "CD_NO_SR",
            ReasonCode::CdNoCsv => "CD_NO_CSV",
            ReasonCode::CdNoPatient => "CD_NO_PATIENT",
            ReasonCode::DvhTypeError => "DVH_TYPE_ERROR",
            ReasonCode::PyradNoDf => "PYRAD_NO_DF",
            ReasonCode::RoiNoFma => "ROI_NO_FMA",
            ReasonCode::FmaNoRoi => "FMA_NO_ROI",
            ReasonCode::MlNoData => "ML_NO_DATA",
            ReasonCode::MldsNoInput => "MLDS_NO_INPUT",
            ReasonCode::KmNoData => "KM_NO_DATA",
            ReasonCode::RoiCleanNoMap => "ROI_CLEAN_NO_MAP",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one step run for one patient (or one batch-level run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub success: bool,
    pub reason: ReasonCode,
    /// Carried only by the subgroup-filter stage: whether this patient is
    /// inside the configured filter. Distinct from `success`, which reports
    /// that the filter itself evaluated cleanly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within_filter: Option<bool>,
}

impl StepOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            reason: ReasonCode::Success,
            within_filter: None,
        }
    }

    pub fn skip() -> Self {
        Self {
            success: false,
            reason: ReasonCode::Skip,
            within_filter: None,
        }
    }

    pub fn interrupt() -> Self {
        Self {
            success: false,
            reason: ReasonCode::Interrupt,
            within_filter: None,
        }
    }

    pub fn failure(reason: ReasonCode) -> Self {
        Self {
            success: false,
            reason,
            within_filter: None,
        }
    }

    /// Outcome of a cleanly evaluated subgroup filter.
    pub fn filtered(within: bool) -> Self {
        Self {
            success: true,
            reason: ReasonCode::Success,
            within_filter: Some(within),
        }
    }

    pub fn is_interrupt(&self) -> bool {
        self.reason == ReasonCode::Interrupt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_strings_are_stable() {
        assert_eq!(ReasonCode::Success.as_str(), "SUCCESS");
        assert_eq!(ReasonCode::Skip.as_str(), "SKIP");
        assert_eq!(ReasonCode::Interrupt.as_str(), "INTERRUPT");
        assert_eq!(ReasonCode::IsoNoRxDose.as_str(), "ISO_NO_RX_DOSE");
        assert_eq!(ReasonCode::CdNoSr.as_str(), "CD_NO_SR");
        assert_eq!(ReasonCode::DvhTypeError.as_str(), "DVH_TYPE_ERROR");
        assert_eq!(ReasonCode::PyradNoDf.as_str(), "PYRAD_NO_DF");
        assert_eq!(ReasonCode::RoiNoFma.as_str(), "ROI_NO_FMA");
        assert_eq!(ReasonCode::FmaNoRoi.as_str(), "FMA_NO_ROI");
    }

    #[test]
    fn filtered_outcome_is_distinct_from_success() {
        let inside = StepOutcome::filtered(true);
        let outside = StepOutcome::filtered(false);
        assert!(inside.success && outside.success);
        assert_eq!(inside.within_filter, Some(true));
        assert_eq!(outside.within_filter, Some(false));
        assert_eq!(StepOutcome::success().within_filter, None);
    }
}
