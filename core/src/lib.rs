pub mod attribute_scorers;
pub mod config;
pub mod error;
pub mod estimator;
pub mod feature_preparer;
pub mod hybrid_predictor;
pub mod model;
pub mod pipeline;
pub mod record;
pub mod risk_tier;
pub mod rng;
pub mod rule_scorer;
pub mod store;
pub mod summary;
pub mod types;
