//! Standardized uptake value scaling.
//!
//! PET voxels arrive as activity concentration (Bq/ml) after rescale; SUV
//! body-weight scaling needs the patient weight and the injected dose
//! decayed from injection time to acquisition time.

use chrono::NaiveTime;

/// Parses a DICOM TM value (`HHMMSS` with optional fraction).
pub fn parse_dicom_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    if trimmed.len() < 6 {
        return None;
    }
    NaiveTime::parse_from_str(trimmed, "%H%M%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(&trimmed[..6], "%H%M%S"))
        .ok()
}

/// Injected dose decayed from injection to acquisition.
///
/// Same-day acquisition is assumed; a negative elapsed time wraps over
/// midnight.
pub fn decay_corrected_dose(
    total_dose_bq: f64,
    half_life_s: f64,
    injection: NaiveTime,
    acquisition: NaiveTime,
) -> f64 {
    if half_life_s <= 0.0 {
        return total_dose_bq;
    }
    let mut elapsed = (acquisition - injection).num_seconds() as f64;
    if elapsed < 0.0 {
        elapsed += 24.0 * 3600.0;
    }
    total_dose_bq * 0.5_f64.powf(elapsed / half_life_s)
}

/// Body-weight SUV factor: multiply an activity concentration in Bq/ml by
/// this to get SUVbw (g/ml).
pub fn suv_factor(weight_kg: f64, decayed_dose_bq: f64) -> Option<f64> {
    if weight_kg <= 0.0 || decayed_dose_bq <= 0.0 {
        return None;
    }
    Some(weight_kg * 1000.0 / decayed_dose_bq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_fractional_times() {
        assert_eq!(
            parse_dicom_time("093000"),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert!(parse_dicom_time("093000.123456").is_some());
        assert!(parse_dicom_time("9:30").is_none());
    }

    #[test]
    fn one_half_life_halves_the_dose() {
        let injection = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let acquisition = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let decayed = decay_corrected_dose(4.0e8, 3600.0, injection, acquisition);
        assert!((decayed - 2.0e8).abs() < 1.0);
    }

    #[test]
    fn midnight_wrap_is_positive() {
        let injection = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        let acquisition = NaiveTime::from_hms_opt(0, 30, 0).unwrap();
        let decayed = decay_corrected_dose(1.0e8, 3600.0, injection, acquisition);
        assert!((decayed - 0.5e8).abs() < 1.0);
    }

    #[test]
    fn factor_rejects_degenerate_inputs() {
        assert!(suv_factor(0.0, 1.0e8).is_none());
        assert!(suv_factor(70.0, 0.0).is_none());
        let factor = suv_factor(70.0, 3.5e8).unwrap();
        assert!((factor - 0.2e-3).abs() < 1e-9);
    }
}
