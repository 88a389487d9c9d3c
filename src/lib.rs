pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::market_data::feature_assembler::FeatureAssembler;
pub use application::ml::predictor::StockPredictor;
pub use config::PredictorConfig;
pub use domain::errors::PredictionError;
