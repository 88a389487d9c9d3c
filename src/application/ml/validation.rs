//! Expanding-window time-series cross-validation and the R² metric.

use std::ops::Range;

/// One chronological fold: train on a prefix, validate on the block right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Range<usize>,
    pub validation: Range<usize>,
}

/// Expanding-window splitter over `n_samples` ordered rows.
///
/// Validation blocks have `n_samples / (n_splits + 1)` rows and tile the tail of the
/// series; the remainder goes to the first training prefix.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesSplit {
    n_splits: usize,
}

impl TimeSeriesSplit {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// Smallest sample count that gives every fold a non-empty train and validation block.
    pub fn min_samples(&self) -> usize {
        self.n_splits + 1
    }

    pub fn split(&self, n_samples: usize) -> Vec<Fold> {
        if self.n_splits == 0 || n_samples < self.min_samples() {
            return Vec::new();
        }
        let test_size = n_samples / (self.n_splits + 1);
        let first_test = n_samples - self.n_splits * test_size;
        (0..self.n_splits)
            .map(|k| {
                let start = first_test + k * test_size;
                Fold {
                    train: 0..start,
                    validation: start..start + test_size,
                }
            })
            .collect()
    }
}

/// Coefficient of determination.
///
/// A constant truth gives 1.0 for a perfect fit and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual[..n]
        .iter()
        .zip(&predicted[..n])
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
