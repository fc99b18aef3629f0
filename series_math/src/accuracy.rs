//! Forecast accuracy metrics
//!
//! All metrics compare predictions against held-out actual values of the
//! same, non-zero length.

use crate::{MathError, Result};

fn check_lengths(predicted: &[f64], actual: &[f64]) -> Result<()> {
    if predicted.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot score an empty forecast".to_string(),
        ));
    }
    if predicted.len() != actual.len() {
        return Err(MathError::InvalidInput(format!(
            "Forecast length ({}) doesn't match actual length ({})",
            predicted.len(),
            actual.len()
        )));
    }
    Ok(())
}

/// Mean absolute error between predictions and actual values
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(predicted, actual)?;

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).abs())
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Mean squared error between predictions and actual values
pub fn mean_squared_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(predicted, actual)?;

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).powi(2))
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Root mean squared error between predictions and actual values
pub fn root_mean_squared_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(predicted, actual)?.sqrt())
}
