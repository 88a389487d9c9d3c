//! Weighted combination of per-model point estimates.

use crate::domain::errors::PredictionError;
use crate::domain::ml::prediction::ConfidenceLabel;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::warn;

/// Weight substituted for a missing, non-positive or non-finite validation score.
pub const NEUTRAL_WEIGHT: f64 = 0.5;

pub fn weight_for(score: Option<f64>) -> f64 {
    match score {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => NEUTRAL_WEIGHT,
    }
}

/// One surviving model's contribution.
#[derive(Debug, Clone)]
pub struct Member {
    pub model: String,
    pub estimate: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleEstimate {
    pub estimate: f64,
    pub estimates: BTreeMap<String, f64>,
    /// Raw (unnormalized) weights
    pub weights: BTreeMap<String, f64>,
    /// Population standard deviation of the member estimates
    pub spread_std: f64,
    /// Max minus min of the member estimates
    pub spread_range: f64,
    pub confidence_score: f64,
    pub confidence: ConfidenceLabel,
}

/// Weighted mean of the member estimates plus agreement-based confidence.
///
/// confidence = 1 / (1 + std / estimate) * mean(raw weights). The ratio is not
/// guarded for estimates near zero; a non-finite result is reported as an error.
pub fn combine(members: &[Member]) -> Result<EnsembleEstimate, PredictionError> {
    if members.is_empty() {
        return Err(PredictionError::DegenerateEstimate {
            reason: "no surviving models".to_string(),
        });
    }

    let total_weight: f64 = members.iter().map(|m| m.weight).sum();
    if !(total_weight.is_finite() && total_weight > 0.0) {
        return Err(PredictionError::DegenerateEstimate {
            reason: format!("total weight {}", total_weight),
        });
    }
    let estimate = members
        .iter()
        .map(|m| m.estimate * m.weight / total_weight)
        .sum::<f64>();

    let values: Vec<f64> = members.iter().map(|m| m.estimate).collect();
    let spread_std = values.iter().population_std_dev();
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let mean_weight = members.iter().map(|m| m.weight).mean();

    if estimate <= 0.0 {
        warn!(
            "Ensemble estimate {:.4} is not positive; confidence ratio is unreliable",
            estimate
        );
    }
    let confidence_score = 1.0 / (1.0 + spread_std / estimate) * mean_weight;
    if !estimate.is_finite() || !confidence_score.is_finite() {
        return Err(PredictionError::DegenerateEstimate {
            reason: format!(
                "estimate {} with spread {} gives confidence {}",
                estimate, spread_std, confidence_score
            ),
        });
    }

    Ok(EnsembleEstimate {
        estimate,
        estimates: members
            .iter()
            .map(|m| (m.model.clone(), m.estimate))
            .collect(),
        weights: members.iter().map(|m| (m.model.clone(), m.weight)).collect(),
        spread_std,
        spread_range: hi - lo,
        confidence_score,
        confidence: ConfidenceLabel::from_score(confidence_score),
    })
}
