//! Product-limit (Kaplan-Meier) survival estimation.

/// One step of the survival curve.
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalPoint {
    pub time: f64,
    pub at_risk: usize,
    pub events: usize,
    pub survival: f64,
}

/// Product-limit estimate over `(time, event)` observations; `event` is
/// false for censored subjects. Output has one point per distinct event
/// time, in time order.
pub fn product_limit(observations: &[(f64, bool)]) -> Vec<SurvivalPoint> {
    let mut sorted: Vec<(f64, bool)> = observations
        .iter()
        .copied()
        .filter(|(time, _)| time.is_finite() && *time >= 0.0)
        .collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut curve = Vec::new();
    let mut survival = 1.0;
    let mut at_risk = sorted.len();
    let mut index = 0;

    while index < sorted.len() {
        let time = sorted[index].0;
        let mut events = 0;
        let mut leaving = 0;
        while index < sorted.len() && sorted[index].0 == time {
            if sorted[index].1 {
                events += 1;
            }
            leaving += 1;
            index += 1;
        }
        if events > 0 {
            survival *= 1.0 - events as f64 / at_risk as f64;
            curve.push(SurvivalPoint {
                time,
                at_risk,
                events,
                survival,
            });
        }
        at_risk -= leaving;
    }
    curve
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_events_no_censoring() {
        let curve = product_limit(&[(1.0, true), (2.0, true), (3.0, true), (4.0, true)]);
        assert_eq!(curve.len(), 4);
        assert!((curve[0].survival - 0.75).abs() < 1e-12);
        assert!((curve[3].survival - 0.0).abs() < 1e-12);
    }

    #[test]
    fn censoring_reduces_risk_set_without_a_step() {
        let curve = product_limit(&[(1.0, true), (2.0, false), (3.0, true)]);
        assert_eq!(curve.len(), 2);
        // After one event of three: S = 2/3. Censor at 2 leaves one at
        // risk, so the event at 3 drops survival to zero.
        assert!((curve[0].survival - 2.0 / 3.0).abs() < 1e-12);
        assert!((curve[1].survival - 0.0).abs() < 1e-12);
        assert_eq!(curve[1].at_risk, 1);
    }

    #[test]
    fn tied_event_times_are_one_step() {
        let curve = product_limit(&[(5.0, true), (5.0, true), (8.0, false)]);
        assert_eq!(curve.len(), 1);
        assert_eq!(curve[0].events, 2);
        assert!((curve[0].survival - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_or_invalid_input_is_empty() {
        assert!(product_limit(&[]).is_empty());
        assert!(product_limit(&[(f64::NAN, true), (-1.0, true)]).is_empty());
    }
}
