use crate::domain::errors::ModelFailure;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse confidence bucket derived from the ensemble confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
}

impl ConfidenceLabel {
    /// Boundaries are exclusive: exactly 0.8 is Medium, exactly 0.6 is Low.
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            ConfidenceLabel::High
        } else if score > 0.6 {
            ConfidenceLabel::Medium
        } else {
            ConfidenceLabel::Low
        }
    }
}

impl fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLabel::High => write!(f, "High"),
            ConfidenceLabel::Medium => write!(f, "Medium"),
            ConfidenceLabel::Low => write!(f, "Low"),
        }
    }
}

/// Output of one ensemble prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub symbol: String,
    pub predicted_price: f64,
    /// Close of the newest bar supplied
    pub current_price: f64,
    /// Date of the feature row the models saw; earlier than the newest bar when
    /// its indicators were undefined
    pub feature_date: NaiveDate,
    pub price_change: f64,
    pub price_change_pct: f64,
    pub individual_predictions: BTreeMap<String, f64>,
    /// Raw (unnormalized) weight of each surviving model
    pub model_weights: BTreeMap<String, f64>,
    pub prediction_std: f64,
    pub prediction_range: f64,
    pub confidence: ConfidenceLabel,
    pub confidence_score: f64,
    /// Models that failed at inference and were left out of the combination
    pub excluded_models: Vec<ModelFailure>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Summary of a predictor's trained state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub symbol: String,
    pub is_trained: bool,
    pub models: Vec<String>,
    pub feature_count: usize,
    pub model_scores: BTreeMap<String, f64>,
    pub top_features: Vec<FeatureImportance>,
}

/// How a model slot fared during training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotOutcome {
    Trained { fold_scores: Vec<f64>, score: f64 },
    Failed { cause: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotReport {
    pub model: String,
    pub outcome: SlotOutcome,
}

/// Diagnostics returned by a successful training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub rows: usize,
    pub feature_count: usize,
    pub slots: Vec<SlotReport>,
    pub importances: Vec<FeatureImportance>,
}

impl ValidationReport {
    pub fn trained_models(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|s| matches!(s.outcome, SlotOutcome::Trained { .. }))
            .map(|s| s.model.as_str())
            .collect()
    }

    pub fn failures(&self) -> Vec<ModelFailure> {
        self.slots
            .iter()
            .filter_map(|s| match &s.outcome {
                SlotOutcome::Failed { cause } => Some(ModelFailure {
                    model: s.model.clone(),
                    cause: cause.clone(),
                }),
                SlotOutcome::Trained { .. } => None,
            })
            .collect()
    }
}
