//! Train/test backtesting of the seasonal forecaster
//!
//! Diagnostic only: results never feed the production forecast table.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, HoltWinters, HoltWintersFit};
use serde::Serialize;
use std::fmt;

/// Default number of training points, leaving the rest of a 34-month
/// history for testing.
pub const DEFAULT_TRAIN_LENGTH: usize = 26;

/// Predictions and accuracy on the held-out part of a series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    /// Predictions for the test window, unrounded
    pub predictions: Vec<f64>,
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

impl fmt::Display for BacktestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Backtest over {} periods:", self.predictions.len())?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        Ok(())
    }
}

/// Split a series into its first `train_length` points and the remainder
pub fn split(series: &[f64], train_length: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    if train_length >= series.len() {
        return Err(ForecastError::InsufficientData(format!(
            "Training length {} leaves no test data in a series of {}",
            train_length,
            series.len()
        )));
    }

    Ok((
        series[..train_length].to_vec(),
        series[train_length..].to_vec(),
    ))
}

/// Split with the extra requirement that training covers a full season
pub fn split_seasonal(
    series: &[f64],
    train_length: usize,
    seasonal_period: usize,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if train_length < seasonal_period {
        return Err(ForecastError::InsufficientData(format!(
            "Training length {} is shorter than one seasonal cycle ({})",
            train_length, seasonal_period
        )));
    }
    split(series, train_length)
}

/// Forecast `test.len()` steps from `model` and score them against `test`
pub fn evaluate(model: &HoltWintersFit, test: &[f64]) -> Result<BacktestReport> {
    let predictions = model.predict(test.len())?;
    let mae = series_math::mean_absolute_error(&predictions, test)?;
    let rmse = series_math::root_mean_squared_error(&predictions, test)?;

    Ok(BacktestReport {
        predictions,
        mae,
        rmse,
    })
}

/// Split `series`, train `model` on the first part and evaluate on the rest
pub fn backtest(model: &HoltWinters, series: &[f64], train_length: usize) -> Result<BacktestReport> {
    let (train, test) = split_seasonal(series, train_length, model.seasonal_period())?;
    let fitted = model.train(&train)?;
    evaluate(&fitted, &test)
}
