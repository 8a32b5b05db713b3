//! Hold-out split and regression metrics.

use crate::rng::{TrainingRng, SPLIT_STREAM};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldoutMetrics {
    pub r2: f64,
    pub mae: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Shuffle `0..n` with the split stream and cut off `ceil(n * test_fraction)`
/// rows for testing. At least one row always stays in the training set.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = TrainingRng::new(seed, SPLIT_STREAM);
    rng.shuffle(&mut indices);

    let test_rows = ((n as f64) * test_fraction).ceil() as usize;
    let test_rows = test_rows.min(n.saturating_sub(1));
    let train = indices.split_off(test_rows);
    (train, indices)
}

/// Coefficient of determination. A constant truth scores 1.0 when matched
/// exactly and 0.0 otherwise.
pub fn r2_score(truth: &[f64], predicted: &[f64]) -> f64 {
    let n = truth.len() as f64;
    if truth.is_empty() {
        return 0.0;
    }
    let mean = truth.iter().sum::<f64>() / n;
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_res: f64 = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mean_absolute_error(truth: &[f64], predicted: &[f64]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / truth.len() as f64
}
