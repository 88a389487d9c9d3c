use super::decision_tree::{RegressionTree, SplitStrategy, TreeParams};
use super::regressor::{Regressor, check_rows, check_training_data, mean_importances};
use crate::config::GradientBoostingParams;
use crate::domain::errors::ModelError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

/// Least-squares gradient boosting: starts from the target mean and fits each stage's
/// tree to the current residuals, shrunk by the learning rate.
pub struct GradientBoostingModel {
    params: GradientBoostingParams,
    seed: u64,
    n_features: usize,
    init: f64,
    stages: Vec<RegressionTree>,
}

impl GradientBoostingModel {
    pub fn new(params: GradientBoostingParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            n_features: 0,
            init: 0.0,
            stages: Vec::new(),
        }
    }
}

impl Regressor for GradientBoostingModel {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        let n_features = check_training_data(x, y)?;
        let tree_params = TreeParams {
            max_depth: self.params.max_depth as usize,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            strategy: SplitStrategy::Best,
        };
        let lr = self.params.learning_rate;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let init = y.iter().sum::<f64>() / y.len() as f64;
        let mut current = vec![init; y.len()];
        let mut stages = Vec::with_capacity(self.params.n_stages);

        for _ in 0..self.params.n_stages {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, p)| t - p).collect();
            let mut tree = RegressionTree::new(tree_params);
            tree.fit(x, &residuals, &mut rng)?;
            for (pred, row) in current.iter_mut().zip(x) {
                *pred += lr * tree.predict_row(row)?;
            }
            stages.push(tree);
        }

        let mse = y
            .iter()
            .zip(&current)
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        debug!("Gradient boosting fitted: {} stages, train MSE {:.6}", stages.len(), mse);

        self.n_features = n_features;
        self.init = init;
        self.stages = stages;
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if self.stages.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_rows(x, Some(self.n_features))?;
        let lr = self.params.learning_rate;
        x.iter()
            .map(|row| {
                let mut value = self.init;
                for tree in &self.stages {
                    value += lr * tree.predict_row(row)?;
                }
                Ok(value)
            })
            .collect()
    }

    fn importances(&self) -> Option<Vec<f64>> {
        mean_importances(self.stages.iter().map(|t| t.importances()), self.n_features)
    }
}
