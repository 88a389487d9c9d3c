use crate::domain::errors::PredictionError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One usable trading day: every feature defined plus the next day's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    /// Actual close of this row's bar (not a model input)
    pub close: f64,
    pub features: Vec<f64>,
    pub target: f64,
}

/// Chronological feature rows sharing one column list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, rows: Vec<FeatureRow>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.features.get(idx).copied())
    }

    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.features.clone()).collect()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.target).collect()
    }
}

/// Most recent fully-defined feature vector, used for live inference.
///
/// Its next-day target does not exist yet and is not part of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestFeatures {
    pub date: NaiveDate,
    pub close: f64,
    pub columns: Vec<String>,
    pub values: Vec<f64>,
}

impl LatestFeatures {
    /// Reorders values to match a column list recorded at training time.
    pub fn select(&self, columns: &[String]) -> Result<Vec<f64>, PredictionError> {
        columns
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .map(|idx| self.values[idx])
                    .ok_or_else(|| PredictionError::FeatureMismatch {
                        column: name.clone(),
                    })
            })
            .collect()
    }
}
