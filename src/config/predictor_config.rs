//! Predictor configuration: defaults, TOML file and environment overrides.

use super::model_config::{ExtraTreesParams, GradientBoostingParams, RandomForestParams};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Everything a `StockPredictor` needs besides the data itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Expanding-window cross-validation folds
    pub cv_folds: usize,
    /// Master seed; per-tree seeds derive from it
    pub seed: u64,
    /// Worker cap for per-tree parallel fitting
    pub max_workers: usize,
    /// Number of ranked features reported by `model_info`
    pub top_features: usize,
    pub random_forest: RandomForestParams,
    pub gradient_boosting: GradientBoostingParams,
    pub extra_trees: ExtraTreesParams,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            cv_folds: 5,
            seed: 42,
            max_workers: 2,
            top_features: 10,
            random_forest: RandomForestParams::default(),
            gradient_boosting: GradientBoostingParams::default(),
            extra_trees: ExtraTreesParams::default(),
        }
    }
}

impl PredictorConfig {
    /// Loads a TOML file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `STOCKCAST_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup on top of `self`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.cv_folds = parse_or(&lookup, "STOCKCAST_CV_FOLDS", self.cv_folds)?;
        self.seed = parse_or(&lookup, "STOCKCAST_SEED", self.seed)?;
        self.max_workers = parse_or(&lookup, "STOCKCAST_MAX_WORKERS", self.max_workers)?;
        self.top_features = parse_or(&lookup, "STOCKCAST_TOP_FEATURES", self.top_features)?;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cv_folds < 2 {
            bail!("cv_folds must be at least 2, got {}", self.cv_folds);
        }
        if self.max_workers == 0 {
            bail!("max_workers must be positive");
        }
        if self.random_forest.n_trees == 0 || self.extra_trees.n_trees == 0 {
            bail!("Tree ensembles need at least one tree");
        }
        if self.gradient_boosting.n_stages == 0 {
            bail!("gradient_boosting.n_stages must be positive");
        }
        let rate = self.gradient_boosting.learning_rate;
        if rate.is_nan() || rate <= 0.0 {
            bail!(
                "gradient_boosting.learning_rate must be positive, got {}",
                rate
            );
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .context(format!("Failed to parse {}", key)),
        None => Ok(default),
    }
}
