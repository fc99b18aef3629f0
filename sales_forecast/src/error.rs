//! Error types for the sales_forecast crate

use polars::prelude::PolarsError;
use series_math::MathError;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Series too short for seasonal fitting or for the requested split
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Period label is not a valid `YYYY-MM`
    #[error("Invalid period format: '{0}' (expected YYYY-MM)")]
    InvalidPeriodFormat(String),

    /// Completeness or share computation with a zero denominator
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// Optimizer did not finish within its time budget
    #[error("Fit timed out after {elapsed_ms} ms (budget {budget_ms} ms)")]
    FitTimeout { elapsed_ms: u128, budget_ms: u128 },

    /// Every shop failed to forecast, so there is nothing to write
    #[error("No shop forecast succeeded ({failed} failed)")]
    NoSuccessfulForecasts { failed: usize },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from numeric routines
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reading or writing CSV rows
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error reading configuration or writing the run report
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

impl ForecastError {
    /// Whether the error is local to one series and must not abort a batch.
    pub fn is_per_series(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData(_)
                | ForecastError::DataError(_)
                | ForecastError::DivisionByZero(_)
                | ForecastError::FitTimeout { .. }
                | ForecastError::MathError(_)
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
