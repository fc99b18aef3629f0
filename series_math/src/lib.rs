//! # Series Math
//!
//! Numeric building blocks shared by the sales forecasting engine.
//! This crate provides a bounded simplex optimizer with an optional time
//! budget, forecast accuracy metrics and the rounding policy applied to
//! unit-sales output.

use thiserror::Error;

pub mod accuracy;
pub mod optimization;
pub mod rounding;

pub use accuracy::{mean_absolute_error, mean_squared_error, root_mean_squared_error};
pub use optimization::{nelder_mead, Bounds, NelderMeadConfig, NelderMeadResult};
pub use rounding::{round_half_up, round_units};

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;
