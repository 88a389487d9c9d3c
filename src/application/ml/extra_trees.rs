use super::decision_tree::{RegressionTree, SplitStrategy, TreeParams};
use super::regressor::{Regressor, check_rows, check_training_data, mean_importances};
use crate::config::ExtraTreesParams;
use crate::domain::errors::ModelError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::debug;

/// Extremely randomized trees: every tree sees the full sample and draws one random
/// threshold per feature at each node.
///
/// Trees are grown on a dedicated rayon pool; tree `i` is seeded with `seed + i`, so the
/// forest is identical whatever the worker count or scheduling.
pub struct ExtraTreesModel {
    params: ExtraTreesParams,
    seed: u64,
    workers: usize,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl ExtraTreesModel {
    pub fn new(params: ExtraTreesParams, seed: u64, workers: usize) -> Self {
        Self {
            params,
            seed,
            workers: workers.max(1),
            n_features: 0,
            trees: Vec::new(),
        }
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.params.max_depth as usize,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            strategy: SplitStrategy::Random,
        }
    }
}

impl Regressor for ExtraTreesModel {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        let n_features = check_training_data(x, y)?;
        let tree_params = self.tree_params();
        let seed = self.seed;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| ModelError::TrainingFailed(format!("thread pool: {}", e)))?;

        let trees = pool.install(|| {
            (0..self.params.n_trees)
                .into_par_iter()
                .map(|i| {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                    let mut tree = RegressionTree::new(tree_params);
                    tree.fit(x, y, &mut rng)?;
                    Ok(tree)
                })
                .collect::<Result<Vec<_>, ModelError>>()
        })?;

        debug!(
            "Extra trees fitted: {} trees on {} workers",
            trees.len(),
            self.workers
        );
        self.n_features = n_features;
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_rows(x, Some(self.n_features))?;
        x.iter()
            .map(|row| {
                let mut total = 0.0;
                for tree in &self.trees {
                    total += tree.predict_row(row)?;
                }
                Ok(total / self.trees.len() as f64)
            })
            .collect()
    }

    fn importances(&self) -> Option<Vec<f64>> {
        mean_importances(self.trees.iter().map(|t| t.importances()), self.n_features)
    }
}
