//! Error types shared by the forecast, correction and loading code.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the forecasting and bias-correction core.
///
/// The metric engine never returns these; degenerate statistics surface as
/// NaN fields instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Historical dataset or model bundle is not loaded.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Requested forecast window is empty or reversed.
    #[error("invalid date range: end date {end} must be after start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Bad selector, schema mismatch, unreadable or unsupported input file.
    #[error("validation error: {0}")]
    Validation(String),

    /// Engineered feature table lacks columns the model bundle expects.
    #[error("feature mismatch: bundle expects columns not produced by feature engineering: {}", missing.join(", "))]
    FeatureMismatch { missing: Vec<String> },

    /// Unexpected numeric failure inside a model or transform.
    #[error("computation error: {0}")]
    Computation(String),
}

impl Error {
    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DataUnavailable(_) => "DataUnavailable",
            Error::InvalidRange { .. } => "InvalidRange",
            Error::Validation(_) => "ValidationError",
            Error::FeatureMismatch { .. } => "FeatureMismatch",
            Error::Computation(_) => "ComputationError",
        }
    }
}
