use crate::domain::errors::PredictionError;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, OrderStatistics};

/// Median / interquartile-range scaler, fitted once and shared by every model.
///
/// A column whose IQR is zero keeps a unit scale so it is only centered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustScaler {
    centers: Vec<f64>,
    scales: Vec<f64>,
}

impl RobustScaler {
    pub fn fit(x: &[Vec<f64>]) -> Result<Self, PredictionError> {
        let width = x.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err(PredictionError::ScalingFailed {
                reason: "empty feature matrix".to_string(),
            });
        }

        let mut centers = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);
        for col in 0..width {
            let mut values = Vec::with_capacity(x.len());
            for (i, row) in x.iter().enumerate() {
                match row.get(col) {
                    Some(v) if v.is_finite() => values.push(*v),
                    Some(_) => {
                        return Err(PredictionError::ScalingFailed {
                            reason: format!("non-finite value in row {}, column {}", i, col),
                        });
                    }
                    None => {
                        return Err(PredictionError::ScalingFailed {
                            reason: format!("row {} has {} columns, expected {}", i, row.len(), width),
                        });
                    }
                }
            }

            let mut data = Data::new(values);
            let median = data.median();
            let iqr = data.upper_quartile() - data.lower_quartile();
            centers.push(median);
            scales.push(if iqr > 0.0 && iqr.is_finite() { iqr } else { 1.0 });
        }

        Ok(Self { centers, scales })
    }

    pub fn n_features(&self) -> usize {
        self.centers.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if row.len() != self.centers.len() {
            return Err(PredictionError::ScalingFailed {
                reason: format!(
                    "row has {} columns, scaler was fitted on {}",
                    row.len(),
                    self.centers.len()
                ),
            });
        }
        Ok(row
            .iter()
            .zip(self.centers.iter().zip(&self.scales))
            .map(|(v, (c, s))| (v - c) / s)
            .collect())
    }

    pub fn transform(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PredictionError> {
        x.iter().map(|row| self.transform_row(row)).collect()
    }
}
