//! Configuration module for Stockcast.
//!
//! Configuration is an explicit value passed into the predictor; nothing here is global.

mod model_config;
mod predictor_config;

pub use model_config::{ExtraTreesParams, GradientBoostingParams, RandomForestParams};
pub use predictor_config::PredictorConfig;
