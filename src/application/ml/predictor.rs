use super::ensemble::{self, Member};
use super::training::{TrainedEnsemble, TrainingEngine};
use crate::application::market_data::feature_assembler::FeatureAssembler;
use crate::config::PredictorConfig;
use crate::domain::errors::{ModelError, ModelFailure, ModelStage, PredictionError};
use crate::domain::market::bar::BarSeries;
use crate::domain::market::lookback::LookbackPeriod;
use crate::domain::ml::feature_table::FeatureTable;
use crate::domain::ml::prediction::{ModelInfo, PredictionResult, ValidationReport};
use crate::domain::ports::BarSeriesProvider;
use anyhow::Context;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Next-day close predictor for one symbol: feature assembly, an ensemble of
/// cross-validated regressors and a confidence-scored combination.
///
/// A predictor is cheap to build and holds no shared state; `train` replaces the
/// ensemble only when it succeeds.
pub struct StockPredictor {
    symbol: String,
    config: PredictorConfig,
    assembler: FeatureAssembler,
    engine: TrainingEngine,
    state: Option<TrainedEnsemble>,
}

impl StockPredictor {
    pub fn new(symbol: impl Into<String>, config: PredictorConfig) -> Self {
        let engine = TrainingEngine::new(&config);
        Self::with_engine(symbol, config, engine)
    }

    /// Predictor with a custom set of model slots.
    pub fn with_engine(
        symbol: impl Into<String>,
        config: PredictorConfig,
        engine: TrainingEngine,
    ) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            config,
            assembler: FeatureAssembler::new(),
            engine,
            state: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    pub fn assemble(&self, series: &BarSeries) -> Result<FeatureTable, PredictionError> {
        self.assembler.assemble(series)
    }

    pub fn train(&mut self, table: &FeatureTable) -> Result<ValidationReport, PredictionError> {
        if table.is_empty() {
            return Err(PredictionError::InsufficientHistory {
                rows: 0,
                required: self.engine.min_rows(),
            });
        }
        let trained = self.engine.train(table)?;
        let report = trained.report.clone();
        info!(
            "{}: trained {} of {} models",
            self.symbol,
            trained.models.len(),
            report.slots.len()
        );
        self.state = Some(trained);
        Ok(report)
    }

    pub fn predict(&self, series: &BarSeries) -> Result<PredictionResult, PredictionError> {
        let state = self.state.as_ref().ok_or(PredictionError::UntrainedModel)?;

        let latest = self.assembler.latest_row(series)?;
        let last_bar = series.last().ok_or_else(|| PredictionError::DataUnavailable {
            symbol: self.symbol.clone(),
        })?;
        if latest.date != last_bar.date {
            warn!(
                "{}: newest bar {} has undefined features; predicting from {}",
                self.symbol, last_bar.date, latest.date
            );
        }
        let values = latest.select(&state.columns)?;
        let scaled = state.scaler.transform_row(&values)?;
        let input = [scaled];

        let mut members = Vec::with_capacity(state.models.len());
        let mut excluded = Vec::new();
        for trained in &state.models {
            let estimate = trained.model.predict(&input).and_then(|out| {
                out.first()
                    .copied()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| ModelError::PredictionFailed("no finite estimate".to_string()))
            });
            match estimate {
                Ok(estimate) => members.push(Member {
                    model: trained.name.clone(),
                    estimate,
                    weight: ensemble::weight_for(Some(trained.score)),
                }),
                Err(e) => {
                    warn!("Error predicting with {}: {}", trained.name, e);
                    excluded.push(ModelFailure {
                        model: trained.name.clone(),
                        cause: e.to_string(),
                    });
                }
            }
        }
        if members.is_empty() {
            return Err(PredictionError::TotalModelFailure {
                stage: ModelStage::Inference,
                failures: excluded,
            });
        }

        let combined = ensemble::combine(&members)?;
        let current_price = last_bar.close;
        let price_change = combined.estimate - current_price;
        let price_change_pct = price_change / current_price * 100.0;
        info!(
            "{}: predicted {:.2} from {:.2} ({:+.2}%), confidence {}",
            self.symbol, combined.estimate, current_price, price_change_pct, combined.confidence
        );

        Ok(PredictionResult {
            symbol: self.symbol.clone(),
            predicted_price: combined.estimate,
            current_price,
            feature_date: latest.date,
            price_change,
            price_change_pct,
            individual_predictions: combined.estimates,
            model_weights: combined.weights,
            prediction_std: combined.spread_std,
            prediction_range: combined.spread_range,
            confidence: combined.confidence,
            confidence_score: combined.confidence_score,
            excluded_models: excluded,
            timestamp: Utc::now(),
        })
    }

    pub fn model_info(&self) -> ModelInfo {
        match &self.state {
            Some(state) => ModelInfo {
                symbol: self.symbol.clone(),
                is_trained: true,
                models: state.models.iter().map(|m| m.name.clone()).collect(),
                feature_count: state.columns.len(),
                model_scores: state
                    .models
                    .iter()
                    .map(|m| (m.name.clone(), m.score))
                    .collect(),
                top_features: state
                    .report
                    .importances
                    .iter()
                    .take(self.config.top_features)
                    .cloned()
                    .collect(),
            },
            None => ModelInfo {
                symbol: self.symbol.clone(),
                is_trained: false,
                models: self.engine.slot_names(),
                feature_count: 0,
                model_scores: BTreeMap::new(),
                top_features: Vec::new(),
            },
        }
    }

    /// Fetches bars, assembles features, trains and predicts the next close.
    pub fn train_and_predict(
        &mut self,
        provider: &dyn BarSeriesProvider,
        period: LookbackPeriod,
    ) -> anyhow::Result<PredictionResult> {
        let series = provider
            .fetch(&self.symbol, period)
            .with_context(|| format!("Failed to fetch {} bars for {}", period, self.symbol))?;
        if series.is_empty() {
            return Err(PredictionError::DataUnavailable {
                symbol: self.symbol.clone(),
            }
            .into());
        }

        let table = self.assemble(&series)?;
        self.train(&table)?;
        Ok(self.predict(&series)?)
    }
}
