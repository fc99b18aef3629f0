//! Additive-seasonal Holt-Winters without trend
//!
//! Model equations, with `m` the seasonal period:
//! - Forecast: `ŷ_t = l_{t-1} + s_{t-m}`
//! - Level: `l_t = α(y_t - s_{t-m}) + (1-α)l_{t-1}`
//! - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
//!
//! The initial level is the mean of the first cycle and the initial
//! seasonal indices are the first cycle's deviations from it. `α` and `γ`
//! minimize the one-step-ahead sum of squared errors over `[0, 1]²`.

use crate::error::{ForecastError, Result};
use crate::models::{check_horizon, check_series, ForecastModel, ForecastResult, TrainedForecastModel};
use series_math::{nelder_mead, Bounds, NelderMeadConfig};
use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::time::{Duration, Instant};
use tracing::debug;

const COEFFICIENT_BOUNDS: [Bounds; 2] = [(0.0, 1.0), (0.0, 1.0)];

/// Fixed starting points, `[alpha, gamma]`, searched in order.
const STARTING_POINTS: [[f64; 2]; 3] = [[0.5, 0.1], [0.2, 0.05], [0.8, 0.4]];

/// Holt-Winters model settings
#[derive(Debug, Clone)]
pub struct HoltWinters {
    name: String,
    seasonal_period: usize,
    optimizer: NelderMeadConfig,
    fit_budget: Option<Duration>,
}

/// Holt-Winters model fitted to one series
#[derive(Debug, Clone)]
pub struct HoltWintersFit {
    name: String,
    seasonal_period: usize,
    alpha: f64,
    gamma: f64,
    level: f64,
    /// Seasonal indices, position `t % m` for absolute time `t`
    seasonal: Vec<f64>,
    sse: f64,
    n_obs: usize,
    fitted: Vec<f64>,
}

struct SmoothingRun {
    level: f64,
    seasonal: Vec<f64>,
    sse: f64,
    fitted: Vec<f64>,
}

impl HoltWinters {
    /// Create a new Holt-Winters model for the given seasonal period
    pub fn new(seasonal_period: usize) -> Result<Self> {
        if seasonal_period < 2 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be at least 2".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Holt-Winters (additive, m={})", seasonal_period),
            seasonal_period,
            optimizer: NelderMeadConfig::default(),
            fit_budget: None,
        })
    }

    /// Bound the time spent estimating coefficients
    pub fn with_fit_budget(mut self, budget: Option<Duration>) -> Self {
        self.fit_budget = budget;
        self
    }

    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }
}

impl ForecastModel for HoltWinters {
    type Trained = HoltWintersFit;

    fn train(&self, series: &[f64]) -> Result<Self::Trained> {
        let m = self.seasonal_period;
        if series.len() < m {
            return Err(ForecastError::InsufficientData(format!(
                "Holt-Winters needs at least one seasonal cycle ({} points), got {}",
                m,
                series.len()
            )));
        }
        check_series(series)?;

        let started = Instant::now();
        let deadline = self.fit_budget.map(|budget| started + budget);

        let objective = |params: &[f64]| smooth(series, m, params[0], params[1]).sse;

        let mut best: Option<(Vec<f64>, f64)> = None;
        for start in STARTING_POINTS.iter() {
            let result = nelder_mead(
                &objective,
                start,
                &COEFFICIENT_BOUNDS,
                &self.optimizer,
                deadline,
            )?;

            if result.timed_out {
                return Err(ForecastError::FitTimeout {
                    elapsed_ms: started.elapsed().as_millis(),
                    budget_ms: self.fit_budget.unwrap_or_default().as_millis(),
                });
            }

            let improves = best.as_ref().map_or(true, |(_, value)| {
                result.optimal_value.partial_cmp(value) == Some(Ordering::Less)
            });
            if improves {
                best = Some((result.optimal_point, result.optimal_value));
            }
        }

        let (params, _) = best.ok_or_else(|| {
            ForecastError::MathError(series_math::MathError::CalculationError(
                "Optimizer produced no candidate".to_string(),
            ))
        })?;
        let (alpha, gamma) = (params[0], params[1]);
        let run = smooth(series, m, alpha, gamma);

        debug!(
            seasonal_period = m,
            n_obs = series.len(),
            alpha = alpha,
            gamma = gamma,
            sse = run.sse,
            "Holt-Winters fit"
        );

        Ok(HoltWintersFit {
            name: self.name.clone(),
            seasonal_period: m,
            alpha,
            gamma,
            level: run.level,
            seasonal: run.seasonal,
            sse: run.sse,
            n_obs: series.len(),
            fitted: run.fitted,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl HoltWintersFit {
    /// Level smoothing coefficient
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Seasonal smoothing coefficient
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Level at the end of the training data
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn seasonal(&self) -> &[f64] {
        &self.seasonal
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    /// In-sample one-step-ahead sum of squared errors
    pub fn sse(&self) -> f64 {
        self.sse
    }

    /// Length of the training series
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// In-sample one-step-ahead predictions; the first cycle reproduces the data
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    /// Forecast `horizon` values after the end of the training data
    pub fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        check_horizon(horizon)?;
        let m = self.seasonal_period;
        Ok((1..=horizon)
            .map(|h| self.level + self.seasonal[(self.n_obs + h - 1) % m])
            .collect())
    }
}

impl TrainedForecastModel for HoltWintersFit {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        ForecastResult::new(self.predict(horizon)?, horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fit an additive-seasonal model to `series`
pub fn fit(series: &[f64], seasonal_period: usize) -> Result<HoltWintersFit> {
    HoltWinters::new(seasonal_period)?.train(series)
}

/// Forecast `horizon` steps from a fitted model
pub fn forecast(model: &HoltWintersFit, horizon: usize) -> Result<Vec<f64>> {
    model.predict(horizon)
}

fn smooth(series: &[f64], m: usize, alpha: f64, gamma: f64) -> SmoothingRun {
    let first_cycle = &series[..m];
    let mut level = first_cycle.iter().mean();
    let mut seasonal: Vec<f64> = first_cycle.iter().map(|&y| y - level).collect();

    let mut fitted = Vec::with_capacity(series.len());
    fitted.extend_from_slice(first_cycle);
    let mut sse = 0.0;

    for (t, &y) in series.iter().enumerate().skip(m) {
        let idx = t % m;
        let s_prev = seasonal[idx];
        let prediction = level + s_prev;
        fitted.push(prediction);
        sse += (y - prediction).powi(2);

        level = alpha * (y - s_prev) + (1.0 - alpha) * level;
        seasonal[idx] = gamma * (y - level) + (1.0 - gamma) * s_prev;
    }

    SmoothingRun {
        level,
        seasonal,
        sse,
        fitted,
    }
}
