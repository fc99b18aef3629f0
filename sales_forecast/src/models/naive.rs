//! Naive fallback forecasts
//!
//! Used when Holt-Winters cannot finish within its time budget. Neither
//! model estimates anything, so neither can time out.

use crate::error::{ForecastError, Result};
use crate::models::{check_horizon, check_series, ForecastModel, ForecastResult, TrainedForecastModel};
use serde::{Deserialize, Serialize};

/// Which naive forecast replaces a timed-out fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMethod {
    /// Repeat the last observed seasonal cycle
    #[default]
    SeasonalNaive,
    /// Repeat the last observation
    LastValue,
}

impl FallbackMethod {
    /// Forecast `horizon` steps of `series` with this method
    pub fn forecast(&self, series: &[f64], seasonal_period: usize, horizon: usize) -> Result<Vec<f64>> {
        let result = match self {
            FallbackMethod::SeasonalNaive => SeasonalNaive::new(seasonal_period)?
                .train(series)?
                .forecast(horizon)?,
            FallbackMethod::LastValue => LastValue.train(series)?.forecast(horizon)?,
        };
        Ok(result.into_values())
    }
}

/// Seasonal naive model: repeats the last seasonal cycle
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    seasonal_period: usize,
}

/// Seasonal naive model bound to the last cycle of a series
#[derive(Debug, Clone)]
pub struct TrainedSeasonalNaive {
    last_cycle: Vec<f64>,
}

impl SeasonalNaive {
    pub fn new(seasonal_period: usize) -> Result<Self> {
        if seasonal_period == 0 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be positive".to_string(),
            ));
        }
        Ok(Self { seasonal_period })
    }
}

impl ForecastModel for SeasonalNaive {
    type Trained = TrainedSeasonalNaive;

    fn train(&self, series: &[f64]) -> Result<Self::Trained> {
        if series.is_empty() {
            return Err(ForecastError::InsufficientData(
                "Seasonal naive requires at least 1 data point".to_string(),
            ));
        }
        check_series(series)?;

        // Shorter series repeat whatever history they have.
        let period = self.seasonal_period.min(series.len());
        Ok(TrainedSeasonalNaive {
            last_cycle: series[series.len() - period..].to_vec(),
        })
    }

    fn name(&self) -> &str {
        "Seasonal naive"
    }
}

impl TrainedForecastModel for TrainedSeasonalNaive {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        check_horizon(horizon)?;
        let values = self.last_cycle.iter().cycle().take(horizon).cloned().collect();
        ForecastResult::new(values, horizon)
    }

    fn name(&self) -> &str {
        "Seasonal naive"
    }
}

/// Last-value model: flat forecast at the final observation
#[derive(Debug, Clone, Copy, Default)]
pub struct LastValue;

/// Last-value model bound to a series
#[derive(Debug, Clone)]
pub struct TrainedLastValue {
    last_value: f64,
}

impl ForecastModel for LastValue {
    type Trained = TrainedLastValue;

    fn train(&self, series: &[f64]) -> Result<Self::Trained> {
        check_series(series)?;
        let last_value = *series.last().ok_or_else(|| {
            ForecastError::InsufficientData("Last value requires at least 1 data point".to_string())
        })?;
        Ok(TrainedLastValue { last_value })
    }

    fn name(&self) -> &str {
        "Last value"
    }
}

impl TrainedForecastModel for TrainedLastValue {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        check_horizon(horizon)?;
        ForecastResult::new(vec![self.last_value; horizon], horizon)
    }

    fn name(&self) -> &str {
        "Last value"
    }
}
