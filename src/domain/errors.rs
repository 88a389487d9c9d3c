use thiserror::Error;

/// Errors surfaced by the prediction core to its caller.
///
/// Indicator-level degeneracies (zero ranges, zero averages) never appear here:
/// they become missing values and the affected rows are dropped during assembly.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("No price data available for {symbol}")]
    DataUnavailable { symbol: String },

    #[error("Insufficient history: {rows} usable rows, need at least {required}")]
    InsufficientHistory { rows: usize, required: usize },

    #[error("Models not trained. Call train() first.")]
    UntrainedModel,

    #[error("Feature scaling failed: {reason}")]
    ScalingFailed { reason: String },

    #[error("All models failed during {stage}: {}", format_failures(.failures))]
    TotalModelFailure {
        stage: ModelStage,
        failures: Vec<ModelFailure>,
    },

    #[error("Feature column '{column}' recorded at training time is missing")]
    FeatureMismatch { column: String },

    #[error("Ensemble produced a non-finite estimate: {reason}")]
    DegenerateEstimate { reason: String },
}

/// Phase in which a model slot was exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ModelStage {
    Training,
    Inference,
}

impl std::fmt::Display for ModelStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelStage::Training => write!(f, "training"),
            ModelStage::Inference => write!(f, "inference"),
        }
    }
}

/// One model slot's failure, kept for the caller instead of being swallowed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelFailure {
    pub model: String,
    pub cause: String,
}

fn format_failures(failures: &[ModelFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.model, f.cause))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised by an individual regression back-end.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Model not fitted")]
    NotFitted,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}
