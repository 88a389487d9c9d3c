use super::extra_trees::ExtraTreesModel;
use super::gradient_boosting::GradientBoostingModel;
use super::random_forest::RandomForestModel;
use crate::config::PredictorConfig;
use crate::domain::errors::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common interface of every regression back-end in the ensemble.
pub trait Regressor: Send + Sync {
    /// Fits on a row-major feature matrix and its targets, replacing any previous fit.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError>;

    /// One point estimate per input row.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;

    /// Normalized per-feature importances, for models that expose them.
    fn importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// The closed set of model slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    GradientBoosting,
    ExtraTrees,
}

impl ModelKind {
    pub fn all() -> [ModelKind; 3] {
        [
            ModelKind::RandomForest,
            ModelKind::GradientBoosting,
            ModelKind::ExtraTrees,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random_forest",
            ModelKind::GradientBoosting => "gradient_boosting",
            ModelKind::ExtraTrees => "extra_trees",
        }
    }

    /// Fresh, unfitted model configured for this slot.
    pub fn build(&self, config: &PredictorConfig) -> RegressionModel {
        match self {
            ModelKind::RandomForest => RegressionModel::RandomForest(RandomForestModel::new(
                config.random_forest.clone(),
                config.seed,
            )),
            ModelKind::GradientBoosting => RegressionModel::GradientBoosting(
                GradientBoostingModel::new(config.gradient_boosting.clone(), config.seed),
            ),
            ModelKind::ExtraTrees => RegressionModel::ExtraTrees(ExtraTreesModel::new(
                config.extra_trees.clone(),
                config.seed,
                config.max_workers,
            )),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A model slot's back-end, tagged by algorithm family.
pub enum RegressionModel {
    RandomForest(RandomForestModel),
    GradientBoosting(GradientBoostingModel),
    ExtraTrees(ExtraTreesModel),
}

impl RegressionModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            RegressionModel::RandomForest(_) => ModelKind::RandomForest,
            RegressionModel::GradientBoosting(_) => ModelKind::GradientBoosting,
            RegressionModel::ExtraTrees(_) => ModelKind::ExtraTrees,
        }
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            RegressionModel::RandomForest(m) => m,
            RegressionModel::GradientBoosting(m) => m,
            RegressionModel::ExtraTrees(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            RegressionModel::RandomForest(m) => m,
            RegressionModel::GradientBoosting(m) => m,
            RegressionModel::ExtraTrees(m) => m,
        }
    }
}

impl Regressor for RegressionModel {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        self.inner().predict(x)
    }

    fn importances(&self) -> Option<Vec<f64>> {
        self.inner().importances()
    }
}

/// Shape and finiteness checks shared by every back-end; returns the feature count.
pub fn check_training_data(x: &[Vec<f64>], y: &[f64]) -> Result<usize, ModelError> {
    if x.is_empty() {
        return Err(ModelError::InvalidData("empty feature matrix".to_string()));
    }
    if x.len() != y.len() {
        return Err(ModelError::InvalidData(format!(
            "{} feature rows but {} targets",
            x.len(),
            y.len()
        )));
    }
    let n_features = check_rows(x, None)?;
    if y.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidData("non-finite target".to_string()));
    }
    Ok(n_features)
}

/// Verifies every row has `expected` (or the first row's) width and finite values.
pub fn check_rows(x: &[Vec<f64>], expected: Option<usize>) -> Result<usize, ModelError> {
    let width = expected.or_else(|| x.first().map(Vec::len)).unwrap_or(0);
    if width == 0 {
        return Err(ModelError::InvalidData("no feature columns".to_string()));
    }
    for (i, row) in x.iter().enumerate() {
        if row.len() != width {
            return Err(ModelError::InvalidData(format!(
                "row {} has {} features, expected {}",
                i,
                row.len(),
                width
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidData(format!("row {} has non-finite values", i)));
        }
    }
    Ok(width)
}

/// Averages per-member importance vectors and renormalizes them to sum to one.
pub fn mean_importances<'a, I>(members: I, n_features: usize) -> Option<Vec<f64>>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut total = vec![0.0; n_features];
    let mut count = 0usize;
    for member in members {
        for (acc, v) in total.iter_mut().zip(member) {
            *acc += v;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let sum: f64 = total.iter().sum();
    if sum > 0.0 {
        total.iter_mut().for_each(|v| *v /= sum);
    }
    Some(total)
}
