//! First-order feature statistics over in-contour voxel samples.

/// First-order features of one ROI's voxel samples.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstOrderStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub energy: f64,
    pub entropy: f64,
}

const ENTROPY_BINS: usize = 16;

impl FirstOrderStats {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let count = samples.len();
        let n = count as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let mut sorted: Vec<f64> = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let min = sorted[0];
        let max = sorted[count - 1];
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };
        let energy = samples.iter().map(|v| v * v).sum::<f64>();

        // Shannon entropy over a fixed-bin intensity histogram.
        let range = max - min;
        let entropy = if range > 0.0 {
            let mut histogram = [0usize; ENTROPY_BINS];
            for &v in samples {
                let bin = (((v - min) / range) * (ENTROPY_BINS as f64 - 1.0)).floor() as usize;
                histogram[bin.min(ENTROPY_BINS - 1)] += 1;
            }
            -histogram
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.log2()
                })
                .sum::<f64>()
        } else {
            0.0
        };

        Some(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
            median,
            energy,
            entropy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_moments() {
        let stats = FirstOrderStats::from_samples(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.energy, 30.0);
    }

    #[test]
    fn constant_samples_have_zero_entropy() {
        let stats = FirstOrderStats::from_samples(&[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.entropy, 0.0);
    }

    #[test]
    fn uniform_two_level_entropy_is_one_bit() {
        let stats = FirstOrderStats::from_samples(&[0.0, 0.0, 10.0, 10.0]).unwrap();
        assert!((stats.entropy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_is_none() {
        assert!(FirstOrderStats::from_samples(&[]).is_none());
    }
}
