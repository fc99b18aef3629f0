//! Run configuration

use crate::backtest::DEFAULT_TRAIN_LENGTH;
use crate::error::{ForecastError, Result};
use crate::models::FallbackMethod;
use crate::prep::PrepConfig;
use crate::shares::ShareStrategy;
use serde::{Deserialize, Serialize};
use series_math::NelderMeadConfig;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Parameters of one forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of future periods to forecast
    pub horizon: usize,
    /// Length of the seasonal cycle in periods
    pub seasonal_period: usize,
    pub share_strategy: ShareStrategy,
    /// Per-shop time budget for coefficient estimation, in milliseconds
    pub fit_budget_ms: Option<u64>,
    /// Forecast used when a fit exceeds its budget
    pub fallback: FallbackMethod,
    pub backtest_train_length: usize,
    /// Fit shops on the rayon pool; sequential when false
    pub parallel: bool,
    pub optimizer: NelderMeadConfig,
    pub prep: PrepConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 6,
            seasonal_period: 12,
            share_strategy: ShareStrategy::default(),
            fit_budget_ms: None,
            fallback: FallbackMethod::default(),
            backtest_train_length: DEFAULT_TRAIN_LENGTH,
            parallel: true,
            optimizer: NelderMeadConfig::default(),
            prep: PrepConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::ValidationError(
                "horizon must be at least 1".to_string(),
            ));
        }
        if self.seasonal_period < 2 {
            return Err(ForecastError::ValidationError(
                "seasonal_period must be at least 2".to_string(),
            ));
        }
        if let ShareStrategy::TrailingAverage { window: 0 } = self.share_strategy {
            return Err(ForecastError::ValidationError(
                "share window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fit_budget(&self) -> Option<Duration> {
        self.fit_budget_ms.map(Duration::from_millis)
    }
}
