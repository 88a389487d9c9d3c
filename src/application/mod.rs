// Indicator computation and feature assembly
pub mod market_data;

// Model training and ensemble prediction
pub mod ml;
