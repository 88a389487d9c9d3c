use super::regressor::{ModelKind, Regressor, mean_importances};
use super::scaler::RobustScaler;
use super::validation::{TimeSeriesSplit, r2_score};
use crate::config::PredictorConfig;
use crate::domain::errors::{ModelError, ModelStage, PredictionError};
use crate::domain::ml::feature_table::FeatureTable;
use crate::domain::ml::prediction::{FeatureImportance, SlotOutcome, SlotReport, ValidationReport};
use tracing::{info, warn};

/// Builds a fresh, unfitted model for one slot.
pub type ModelFactory = Box<dyn Fn() -> Box<dyn Regressor> + Send + Sync>;

/// A named ensemble member and how to instantiate it.
pub struct SlotSpec {
    pub name: String,
    factory: ModelFactory,
}

impl SlotSpec {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Regressor> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(factory),
        }
    }

    /// Random forest, gradient boosting and extra trees, configured from `config`.
    pub fn standard(config: &PredictorConfig) -> Vec<SlotSpec> {
        ModelKind::all()
            .into_iter()
            .map(|kind| {
                let config = config.clone();
                SlotSpec::new(kind.as_str(), move || {
                    Box::new(kind.build(&config)) as Box<dyn Regressor>
                })
            })
            .collect()
    }

    fn instantiate(&self) -> Box<dyn Regressor> {
        (self.factory)()
    }
}

/// A model refitted on the full table, with its cross-validation score.
pub struct TrainedModel {
    pub name: String,
    pub model: Box<dyn Regressor>,
    pub score: f64,
}

/// Everything inference needs from a training run.
pub struct TrainedEnsemble {
    pub columns: Vec<String>,
    pub scaler: RobustScaler,
    pub models: Vec<TrainedModel>,
    pub report: ValidationReport,
}

/// Cross-validates and fits every slot on one shared, robustly scaled matrix.
pub struct TrainingEngine {
    splitter: TimeSeriesSplit,
    slots: Vec<SlotSpec>,
}

impl TrainingEngine {
    pub fn new(config: &PredictorConfig) -> Self {
        Self::with_slots(config.cv_folds, SlotSpec::standard(config))
    }

    pub fn with_slots(cv_folds: usize, slots: Vec<SlotSpec>) -> Self {
        Self {
            splitter: TimeSeriesSplit::new(cv_folds),
            slots,
        }
    }

    pub fn slot_names(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.name.clone()).collect()
    }

    /// Fewest rows that give every fold a non-empty training and validation block.
    pub fn min_rows(&self) -> usize {
        self.splitter.min_samples()
    }

    pub fn train(&self, table: &FeatureTable) -> Result<TrainedEnsemble, PredictionError> {
        if table.len() < self.min_rows() {
            return Err(PredictionError::InsufficientHistory {
                rows: table.len(),
                required: self.min_rows(),
            });
        }

        let x = table.feature_matrix();
        let y = table.targets();
        let scaler = RobustScaler::fit(&x)?;
        let x_scaled = scaler.transform(&x)?;
        info!(
            "Training {} models on {} rows x {} features",
            self.slots.len(),
            x_scaled.len(),
            table.columns().len()
        );

        let mut models = Vec::with_capacity(self.slots.len());
        let mut reports = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let outcome = self
                .cross_validate(slot, &x_scaled, &y)
                .and_then(|fold_scores| {
                    let mut model = slot.instantiate();
                    model.fit(&x_scaled, &y)?;
                    Ok((model, fold_scores))
                });

            match outcome {
                Ok((model, fold_scores)) => {
                    let score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
                    info!("{} CV R²: {:.4}", slot.name, score);
                    models.push(TrainedModel {
                        name: slot.name.clone(),
                        model,
                        score,
                    });
                    reports.push(SlotReport {
                        model: slot.name.clone(),
                        outcome: SlotOutcome::Trained { fold_scores, score },
                    });
                }
                Err(e) => {
                    warn!("Error training {}: {}", slot.name, e);
                    reports.push(SlotReport {
                        model: slot.name.clone(),
                        outcome: SlotOutcome::Failed {
                            cause: e.to_string(),
                        },
                    });
                }
            }
        }

        let mut report = ValidationReport {
            rows: table.len(),
            feature_count: table.columns().len(),
            slots: reports,
            importances: Vec::new(),
        };
        if models.is_empty() {
            return Err(PredictionError::TotalModelFailure {
                stage: ModelStage::Training,
                failures: report.failures(),
            });
        }
        report.importances = rank_importances(table.columns(), &models);

        Ok(TrainedEnsemble {
            columns: table.columns().to_vec(),
            scaler,
            models,
            report,
        })
    }

    /// Per-fold R² for one slot; any failing fold fails the slot.
    fn cross_validate(
        &self,
        slot: &SlotSpec,
        x: &[Vec<f64>],
        y: &[f64],
    ) -> Result<Vec<f64>, ModelError> {
        let folds = self.splitter.split(x.len());
        if folds.is_empty() {
            return Err(ModelError::InvalidData(format!(
                "{} rows cannot be split into validation folds",
                x.len()
            )));
        }

        folds
            .iter()
            .map(|fold| {
                let mut model = slot.instantiate();
                model.fit(&x[fold.train.clone()], &y[fold.train.clone()])?;
                let predicted = model.predict(&x[fold.validation.clone()])?;
                Ok(r2_score(&y[fold.validation.clone()], &predicted))
            })
            .collect()
    }
}

/// Averages every model's importances and ranks them descending.
fn rank_importances(columns: &[String], models: &[TrainedModel]) -> Vec<FeatureImportance> {
    let per_model: Vec<Vec<f64>> = models
        .iter()
        .filter_map(|m| m.model.importances())
        .filter(|imp| imp.len() == columns.len())
        .collect();
    let Some(averaged) = mean_importances(per_model.iter().map(Vec::as_slice), columns.len())
    else {
        return Vec::new();
    };

    let mut ranked: Vec<FeatureImportance> = columns
        .iter()
        .zip(averaged)
        .map(|(feature, importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::feature_table::FeatureRow;
    use chrono::NaiveDate;

    struct Failing;

    impl Regressor for Failing {
        fn fit(&mut self, _x: &[Vec<f64>], _y: &[f64]) -> Result<(), ModelError> {
            Err(ModelError::TrainingFailed("singular".to_string()))
        }

        fn predict(&self, _x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            Err(ModelError::NotFitted)
        }
    }

    fn table(n: usize) -> FeatureTable {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let rows = (0..n)
            .map(|i| {
                let t = i as f64;
                let signal = (t * 0.2).sin();
                FeatureRow {
                    date: start + chrono::Days::new(i as u64),
                    close: 100.0 + signal,
                    features: vec![signal, (t * 0.37).cos(), 1.0],
                    target: 100.0 + 5.0 * signal,
                }
            })
            .collect();
        FeatureTable::new(
            vec!["signal".into(), "noise".into(), "flat".into()],
            rows,
        )
    }

    fn small_config() -> PredictorConfig {
        let mut config = PredictorConfig::default();
        config.random_forest.n_trees = 10;
        config.extra_trees.n_trees = 10;
        config.gradient_boosting.n_stages = 20;
        config
    }

    #[test]
    fn test_all_slots_train_and_rank_importances() {
        let engine = TrainingEngine::new(&small_config());
        let trained = engine.train(&table(120)).unwrap();

        assert_eq!(trained.models.len(), 3);
        assert_eq!(
            trained.report.trained_models(),
            vec!["random_forest", "gradient_boosting", "extra_trees"]
        );
        for slot in &trained.report.slots {
            match &slot.outcome {
                SlotOutcome::Trained { fold_scores, score } => {
                    assert_eq!(fold_scores.len(), 5);
                    assert!(score.is_finite());
                }
                SlotOutcome::Failed { cause } => panic!("{} failed: {}", slot.model, cause),
            }
        }

        for model in &trained.models {
            let imp = model.model.importances();
            assert_eq!(imp.map(|v| v.len()), Some(3), "{} has no importances", model.name);
        }

        let ranked = &trained.report.importances;
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].feature, "signal");
        assert!(ranked.windows(2).all(|w| w[0].importance >= w[1].importance));
    }

    #[test]
    fn test_partial_failure_is_tolerated() {
        let config = small_config();
        let mut slots = SlotSpec::standard(&config);
        slots.push(SlotSpec::new("broken", || Box::new(Failing) as Box<dyn Regressor>));
        let engine = TrainingEngine::with_slots(config.cv_folds, slots);

        let trained = engine.train(&table(90)).unwrap();
        assert_eq!(trained.models.len(), 3);
        let failures = trained.report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].model, "broken");
        assert!(failures[0].cause.contains("singular"));
    }

    #[test]
    fn test_total_failure() {
        let slots = vec![
            SlotSpec::new("a", || Box::new(Failing) as Box<dyn Regressor>),
            SlotSpec::new("b", || Box::new(Failing) as Box<dyn Regressor>),
        ];
        let engine = TrainingEngine::with_slots(5, slots);
        match engine.train(&table(60)) {
            Err(PredictionError::TotalModelFailure { stage, failures }) => {
                assert_eq!(stage, ModelStage::Training);
                assert_eq!(failures.len(), 2);
            }
            other => panic!("expected total failure, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_too_few_rows() {
        let engine = TrainingEngine::new(&small_config());
        match engine.train(&table(4)) {
            Err(PredictionError::InsufficientHistory { rows, required }) => {
                assert_eq!(rows, 4);
                assert_eq!(required, 6);
            }
            other => panic!("expected insufficient history, got {:?}", other.err()),
        }
        assert!(matches!(
            engine.train(&FeatureTable::default()),
            Err(PredictionError::InsufficientHistory { rows: 0, .. })
        ));
    }
}
