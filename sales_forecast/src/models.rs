//! Forecasting models for monthly sales series

use crate::error::{ForecastError, Result};
use std::fmt::Debug;

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted values, unrounded
    values: Vec<f64>,
    /// Number of periods forecasted
    horizon: usize,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizon: usize) -> Result<Self> {
        if values.len() != horizon {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizon ({})",
                values.len(),
                horizon
            )));
        }

        Ok(Self { values, horizon })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Mean absolute error between forecast and actual values
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        Ok(series_math::mean_absolute_error(&self.values, actual)?)
    }

    /// Root mean squared error between forecast and actual values
    pub fn root_mean_squared_error(&self, actual: &[f64]) -> Result<f64> {
        Ok(series_math::root_mean_squared_error(&self.values, actual)?)
    }
}

/// Trained forecast model bound to exactly one training series
pub trait TrainedForecastModel: Debug + Send {
    /// Generate forecast for the periods following the training data
    fn forecast(&self, horizon: usize) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a series
pub trait ForecastModel: Debug + Clone + Send + Sync {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a series of monthly values
    fn train(&self, series: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Reject empty horizons before any model work happens.
pub(crate) fn check_horizon(horizon: usize) -> Result<()> {
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "Forecast horizon must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Reject negative or non-finite observations.
pub(crate) fn check_series(series: &[f64]) -> Result<()> {
    if let Some((i, v)) = series
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(ForecastError::DataError(format!(
            "Observation {} is {}; sales counts must be finite and non-negative",
            i, v
        )));
    }
    Ok(())
}

pub mod holt_winters;
pub mod naive;

pub use holt_winters::{HoltWinters, HoltWintersFit};
pub use naive::{FallbackMethod, LastValue, SeasonalNaive};
