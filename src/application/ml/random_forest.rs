use super::regressor::{Regressor, check_rows, check_training_data};
use crate::config::RandomForestParams;
use crate::domain::errors::ModelError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::debug;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Bootstrap-aggregated regression forest backed by SmartCore.
///
/// SmartCore keeps split statistics private, so importances are permutation based:
/// the rise in training MSE when one column is shuffled, normalized to sum to one.
pub struct RandomForestModel {
    params: RandomForestParams,
    seed: u64,
    n_features: usize,
    model: Option<Forest>,
    importances: Option<Vec<f64>>,
}

impl RandomForestModel {
    pub fn new(params: RandomForestParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            n_features: 0,
            model: None,
            importances: None,
        }
    }

    fn to_matrix(x: &[Vec<f64>]) -> Result<DenseMatrix<f64>, ModelError> {
        DenseMatrix::from_2d_vec(&x.to_vec())
            .map_err(|e| ModelError::InvalidData(format!("Matrix creation failed: {}", e)))
    }
}

impl Regressor for RandomForestModel {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        let n_features = check_training_data(x, y)?;
        let matrix = Self::to_matrix(x)?;

        // Every feature is a split candidate at every node.
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.params.n_trees)
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_samples_split)
            .with_min_samples_leaf(self.params.min_samples_leaf)
            .with_m(n_features)
            .with_seed(self.seed);

        let model = RandomForestRegressor::fit(&matrix, &y.to_vec(), params)
            .map_err(|e| ModelError::TrainingFailed(e.to_string()))?;
        debug!(
            "Random forest fitted: {} trees on {}x{}",
            self.params.n_trees,
            x.len(),
            n_features
        );

        let importances = permutation_importances(&model, x, y, self.seed)?;
        self.n_features = n_features;
        self.model = Some(model);
        self.importances = Some(importances);
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let model = self.model.as_ref().ok_or(ModelError::NotFitted)?;
        check_rows(x, Some(self.n_features))?;
        forest_predict(model, x)
    }

    fn importances(&self) -> Option<Vec<f64>> {
        self.importances.clone()
    }
}

fn forest_predict(model: &Forest, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
    let matrix = RandomForestModel::to_matrix(x)?;
    model
        .predict(&matrix)
        .map_err(|e| ModelError::PredictionFailed(e.to_string()))
}

fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len().max(1) as f64
}

/// Loss increase per shuffled column, clipped at zero and normalized.
fn permutation_importances(
    model: &Forest,
    x: &[Vec<f64>],
    y: &[f64],
    seed: u64,
) -> Result<Vec<f64>, ModelError> {
    let n_features = x.first().map(Vec::len).unwrap_or(0);
    let baseline = mse(y, &forest_predict(model, x)?);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut shuffled = x.to_vec();
    let mut scores = Vec::with_capacity(n_features);

    for feature in 0..n_features {
        let mut column: Vec<f64> = x.iter().map(|row| row[feature]).collect();
        column.shuffle(&mut rng);
        for (row, v) in shuffled.iter_mut().zip(&column) {
            row[feature] = *v;
        }
        let loss = mse(y, &forest_predict(model, &shuffled)?);
        scores.push((loss - baseline).max(0.0));
        for (row, original) in shuffled.iter_mut().zip(x) {
            row[feature] = original[feature];
        }
    }

    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        scores.iter_mut().for_each(|v| *v /= total);
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![i as f64, ((i * 7) % 11) as f64])
            .collect();
        let y: Vec<f64> = (0..n).map(|i| 10.0 + 2.0 * i as f64).collect();
        (x, y)
    }

    #[test]
    fn test_predict_before_fit() {
        let model = RandomForestModel::new(RandomForestParams::default(), 42);
        assert!(matches!(
            model.predict(&[vec![1.0, 2.0]]),
            Err(ModelError::NotFitted)
        ));
    }

    #[test]
    fn test_fit_tracks_trend() {
        let (x, y) = linear_data(80);
        let mut model = RandomForestModel::new(RandomForestParams::default(), 42);
        model.fit(&x, &y).unwrap();

        let preds = model.predict(&[vec![5.0, 2.0], vec![75.0, 2.0]]).unwrap();
        assert_eq!(preds.len(), 2);
        assert!(preds[0] < preds[1]);
    }

    #[test]
    fn test_permutation_importances() {
        let x: Vec<Vec<f64>> = (0..80)
            .map(|i| vec![i as f64, ((i * 7) % 11) as f64, 3.0])
            .collect();
        let y: Vec<f64> = (0..80).map(|i| 10.0 + 2.0 * i as f64).collect();
        let mut model = RandomForestModel::new(RandomForestParams::default(), 42);
        assert!(model.importances().is_none());
        model.fit(&x, &y).unwrap();

        let imp = model.importances().unwrap();
        assert_eq!(imp.len(), 3);
        assert!(imp[0] > imp[1]);
        // Shuffling a constant column changes nothing.
        assert_eq!(imp[2], 0.0);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = linear_data(60);
        let probe = vec![vec![30.5, 4.0]];

        let mut a = RandomForestModel::new(RandomForestParams::default(), 7);
        let mut b = RandomForestModel::new(RandomForestParams::default(), 7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
    }
}
