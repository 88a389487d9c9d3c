//! Hyperparameter blocks for the three ensemble members.

use serde::{Deserialize, Serialize};

/// Bagged CART forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
        }
    }
}

/// Least-squares boosting over shallow regression trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientBoostingParams {
    pub n_stages: usize,
    pub learning_rate: f64,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_stages: 50,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Extremely randomized trees: random thresholds, no bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraTreesParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ExtraTreesParams {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 8,
            min_samples_split: 3,
            min_samples_leaf: 1,
        }
    }
}
