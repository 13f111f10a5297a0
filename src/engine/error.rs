use thiserror::Error;

use crate::model::Side;

/// Precondition failures of a prediction call. All of them are detected before
/// any simulation runs; no partial result is ever produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("invalid input: {field} = {value} ({reason})")]
    InvalidInput {
        field: String,
        value: f64,
        reason: &'static str,
    },

    #[error("degenerate mean for {team} team: expected runs {mean} must be > 0")]
    DegenerateMean { team: Side, mean: f64 },

    #[error("advanced mode requested but {team} team is missing starting pitcher data")]
    MissingAdvancedInputs { team: Side },

    #[error("distribution rejected parameters: {0}")]
    Distribution(String),
}

impl PredictionError {
    pub fn invalid(field: impl Into<String>, value: f64, reason: &'static str) -> Self {
        PredictionError::InvalidInput {
            field: field.into(),
            value,
            reason,
        }
    }

    /// Stable machine-readable tag for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::InvalidInput { .. } => "invalid_input",
            PredictionError::DegenerateMean { .. } => "degenerate_mean",
            PredictionError::MissingAdvancedInputs { .. } => "missing_advanced_inputs",
            PredictionError::Distribution(_) => "distribution",
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictionError>;
