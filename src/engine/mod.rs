pub mod blend;
pub mod confidence;
pub mod error;
pub mod estimator;
pub mod predictor;
pub mod simulation;

pub use error::PredictionError;
pub use predictor::PredictionEngine;
