//! Cumulative dose-volume histogramming.

/// One DVH bin: the fraction of sampled volume receiving at least `dose`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DvhBin {
    pub dose: f64,
    pub volume_pct: f64,
}

/// Builds a cumulative DVH from per-voxel dose samples.
///
/// Bins run from zero to the maximum sample in `bin_width` steps; each bin
/// reports the percentage of samples at or above that dose.
pub fn cumulative_dvh(samples: &[f64], bin_width: f64) -> Vec<DvhBin> {
    if samples.is_empty() || bin_width <= 0.0 {
        return Vec::new();
    }
    let mut sorted: Vec<f64> = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let max = *sorted.last().unwrap_or(&0.0);
    let total = sorted.len() as f64;

    let bins = (max / bin_width).floor() as usize + 1;
    let mut out = Vec::with_capacity(bins + 1);
    for i in 0..=bins {
        let dose = i as f64 * bin_width;
        // First index with sample >= dose.
        let at_or_above = total - sorted.partition_point(|&v| v < dose) as f64;
        out.push(DvhBin {
            dose,
            volume_pct: at_or_above / total * 100.0,
        });
    }
    out
}
