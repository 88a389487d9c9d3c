// Regression back-ends
pub mod decision_tree;
pub mod extra_trees;
pub mod gradient_boosting;
pub mod random_forest;
pub mod regressor;

// Training, validation and ensembling
pub mod ensemble;
pub mod predictor;
pub mod scaler;
pub mod training;
pub mod validation;
