//! Logistic regression fitted by gradient descent.
//!
//! Features are standardized before fitting; the trained model keeps the
//! standardization parameters so it can score raw feature vectors.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub bias: f64,
    pub means: Vec<f64>,
    pub std_devs: Vec<f64>,
    pub train_accuracy: f64,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Fits a logistic model on rows of raw features against binary labels.
///
/// Returns `None` when there are no rows, no features, or only one label
/// class to learn from.
pub fn train(
    feature_names: &[String],
    rows: &[Vec<f64>],
    labels: &[f64],
    epochs: usize,
    learning_rate: f64,
) -> Option<LogisticModel> {
    let n = rows.len();
    if n == 0 || rows.len() != labels.len() {
        return None;
    }
    let dims = rows[0].len();
    if dims == 0 || rows.iter().any(|r| r.len() != dims) {
        return None;
    }
    let positives = labels.iter().filter(|&&y| y > 0.5).count();
    if positives == 0 || positives == n {
        return None;
    }

    // Standardize per feature.
    let mut means = vec![0.0; dims];
    let mut std_devs = vec![0.0; dims];
    for d in 0..dims {
        let mean = rows.iter().map(|r| r[d]).sum::<f64>() / n as f64;
        let variance = rows.iter().map(|r| (r[d] - mean).powi(2)).sum::<f64>() / n as f64;
        means[d] = mean;
        std_devs[d] = if variance > 0.0 { variance.sqrt() } else { 1.0 };
    }
    let standardized: Vec<Vec<f64>> = rows
        .iter()
        .map(|r| {
            r.iter()
                .enumerate()
                .map(|(d, &v)| (v - means[d]) / std_devs[d])
                .collect()
        })
        .collect();

    let mut weights = vec![0.0; dims];
    let mut bias = 0.0;
    for _ in 0..epochs {
        let mut grad_w = vec![0.0; dims];
        let mut grad_b = 0.0;
        for (row, &label) in standardized.iter().zip(labels) {
            let z = bias + row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>();
            let error = sigmoid(z) - label;
            for d in 0..dims {
                grad_w[d] += error * row[d];
            }
            grad_b += error;
        }
        for d in 0..dims {
            weights[d] -= learning_rate * grad_w[d] / n as f64;
        }
        bias -= learning_rate * grad_b / n as f64;
    }

    let correct = standardized
        .iter()
        .zip(labels)
        .filter(|&(ref row, &label)| {
            let z = bias + row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>();
            (sigmoid(z) >= 0.5) == (label > 0.5)
        })
        .count();

    Some(LogisticModel {
        feature_names: feature_names.to_vec(),
        weights,
        bias,
        means,
        std_devs,
        train_accuracy: correct as f64 / n as f64,
    })
}

impl LogisticModel {
    /// Probability of the positive class for a raw feature vector.
    pub fn predict(&self, raw: &[f64]) -> Option<f64> {
        if raw.len() != self.weights.len() {
            return None;
        }
        let z = self.bias
            + raw
                .iter()
                .enumerate()
                .map(|(d, &v)| (v - self.means[d]) / self.std_devs[d] * self.weights[d])
                .sum::<f64>();
        Some(sigmoid(z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learns_a_separable_threshold() {
        let names = vec!["x".to_string()];
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let labels: Vec<f64> = (0..20).map(|i| if i >= 10 { 1.0 } else { 0.0 }).collect();
        let model = train(&names, &rows, &labels, 500, 0.5).unwrap();
        assert!(model.train_accuracy >= 0.95);
        assert!(model.predict(&[1.0]).unwrap() < 0.5);
        assert!(model.predict(&[18.0]).unwrap() > 0.5);
    }

    #[test]
    fn single_class_is_untrainable() {
        let names = vec!["x".to_string()];
        let rows = vec![vec![1.0], vec![2.0]];
        assert!(train(&names, &rows, &[1.0, 1.0], 10, 0.1).is_none());
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let names = vec!["x".to_string()];
        let rows = vec![vec![1.0], vec![2.0, 3.0]];
        assert!(train(&names, &rows, &[1.0, 0.0], 10, 0.1).is_none());
        let model = train(&names, &[vec![0.0], vec![1.0]], &[0.0, 1.0], 10, 0.1).unwrap();
        assert!(model.predict(&[1.0, 2.0]).is_none());
    }
}
