//! Batch forecast of every shop followed by item disaggregation
//!
//! Shops are fitted independently, optionally on the rayon pool, and the
//! outcomes are merged by shop id so the result never depends on
//! completion order.

use crate::backtest::{backtest, BacktestReport};
use crate::config::ForecastConfig;
use crate::data::{ForecastTable, TrainingMatrix};
use crate::disaggregation::{disaggregate, FinalForecastRow};
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, HoltWinters};
use crate::prep::PreparedData;
use crate::shares::ShareStrategy;
use crate::ShopId;
use chrono::{Local, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use series_math::round_units;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// How the forecast of one shop was obtained
#[derive(Debug, Clone, PartialEq)]
enum ShopOutcome {
    Fitted(Vec<f64>),
    Fallback { values: Vec<f64>, reason: String },
}

/// A shop left out of the forecast and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedShop {
    pub shop_id: ShopId,
    pub reason: String,
}

/// Summary of a forecast run, written next to the forecast file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub generated_on: NaiveDate,
    pub horizon: usize,
    pub seasonal_period: usize,
    pub share_strategy: ShareStrategy,
    /// Shops present in the forecast table
    pub forecast_shops: Vec<ShopId>,
    /// Shops dropped by the completeness filter
    pub excluded_shops: Vec<ShopId>,
    /// Shops whose forecast failed
    pub failed_shops: Vec<FailedShop>,
    /// Shops forecast with the fallback method after a fit timeout
    pub fallback_shops: Vec<ShopId>,
    /// Forecast shops without item shares
    pub shops_without_shares: Vec<ShopId>,
    /// Complete shops whose share window holds no sales
    pub zero_share_shops: Vec<ShopId>,
    pub item_rows: usize,
}

/// Output of [`ForecastPipeline::run`]
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub forecast_table: ForecastTable,
    pub rows: Vec<FinalForecastRow>,
    pub report: RunReport,
}

/// Forecast pipeline
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: ForecastConfig,
    generated_on: Option<NaiveDate>,
}

impl ForecastPipeline {
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            config,
            generated_on: None,
        }
    }

    /// Fix the run date instead of using today's local date
    pub fn with_generated_on(mut self, date: NaiveDate) -> Self {
        self.generated_on = Some(date);
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    fn model(&self) -> Result<HoltWinters> {
        Ok(HoltWinters::new(self.config.seasonal_period)?
            .with_optimizer(self.config.optimizer)
            .with_fit_budget(self.config.fit_budget()))
    }

    fn forecast_shop(&self, model: &HoltWinters, series: &[f64]) -> Result<ShopOutcome> {
        let horizon = self.config.horizon;
        match model.train(series) {
            Ok(fit) => Ok(ShopOutcome::Fitted(fit.predict(horizon)?)),
            Err(err @ ForecastError::FitTimeout { .. }) => {
                let values =
                    self.config
                        .fallback
                        .forecast(series, self.config.seasonal_period, horizon)?;
                Ok(ShopOutcome::Fallback {
                    values,
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Forecast every shop of the matrix and spread the result over items.
    ///
    /// Per-shop failures are reported and excluded. Fails with
    /// `NoSuccessfulForecasts` when no shop could be forecast.
    pub fn run(&self, prepared: &PreparedData) -> Result<ForecastRun> {
        self.config.validate()?;
        let model = self.model()?;
        let matrix = &prepared.matrix;

        let outcomes = self.fit_all(&model, matrix);

        let mut columns = BTreeMap::new();
        let mut failed_shops = Vec::new();
        let mut fallback_shops = Vec::new();
        for (shop_id, outcome) in outcomes {
            let values = match outcome {
                Ok(ShopOutcome::Fitted(values)) => values,
                Ok(ShopOutcome::Fallback { values, reason }) => {
                    warn!(shop_id, %reason, method = ?self.config.fallback, "Using fallback forecast");
                    fallback_shops.push(shop_id);
                    values
                }
                Err(err) if err.is_per_series() => {
                    warn!(shop_id, error = %err, "Shop forecast failed; excluding shop");
                    failed_shops.push(FailedShop {
                        shop_id,
                        reason: err.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(err),
            };
            columns.insert(shop_id, values.into_iter().map(round_units).collect());
        }

        if columns.is_empty() {
            return Err(ForecastError::NoSuccessfulForecasts {
                failed: failed_shops.len(),
            });
        }

        let periods = matrix.last_period().next_n(self.config.horizon)?;
        let forecast_table = ForecastTable::new(periods, columns)?;
        let rows = disaggregate(&forecast_table, &prepared.shares);

        let shops_without_shares: Vec<ShopId> = forecast_table
            .shops()
            .filter(|&shop_id| prepared.shares.shop_records(shop_id).next().is_none())
            .collect();

        let report = RunReport {
            generated_on: self
                .generated_on
                .unwrap_or_else(|| Local::now().date_naive()),
            horizon: self.config.horizon,
            seasonal_period: self.config.seasonal_period,
            share_strategy: self.config.share_strategy,
            forecast_shops: forecast_table.shops().collect(),
            excluded_shops: prepared.excluded_shops.clone(),
            failed_shops,
            fallback_shops,
            shops_without_shares,
            zero_share_shops: prepared.zero_share_shops.clone(),
            item_rows: rows.len(),
        };

        info!(
            forecast_shops = report.forecast_shops.len(),
            failed_shops = report.failed_shops.len(),
            fallback_shops = report.fallback_shops.len(),
            item_rows = report.item_rows,
            "Forecast run complete"
        );

        Ok(ForecastRun {
            forecast_table,
            rows,
            report,
        })
    }

    fn fit_all(
        &self,
        model: &HoltWinters,
        matrix: &TrainingMatrix,
    ) -> BTreeMap<ShopId, Result<ShopOutcome>> {
        let columns: Vec<(ShopId, &[f64])> = matrix.columns().collect();
        if self.config.parallel {
            columns
                .into_par_iter()
                .map(|(shop_id, series)| (shop_id, self.forecast_shop(model, series)))
                .collect()
        } else {
            columns
                .into_iter()
                .map(|(shop_id, series)| (shop_id, self.forecast_shop(model, series)))
                .collect()
        }
    }

    /// Backtest every shop of the matrix with the configured train length
    pub fn backtest_matrix(
        &self,
        matrix: &TrainingMatrix,
    ) -> Result<BTreeMap<ShopId, Result<BacktestReport>>> {
        self.config.validate()?;
        let train_length = self.config.backtest_train_length;
        if train_length < self.config.seasonal_period {
            return Err(ForecastError::ValidationError(format!(
                "backtest_train_length ({}) is shorter than seasonal_period ({})",
                train_length, self.config.seasonal_period
            )));
        }
        let model = self.model()?;
        let columns: Vec<(ShopId, &[f64])> = matrix.columns().collect();

        let reports = if self.config.parallel {
            columns
                .into_par_iter()
                .map(|(shop_id, series)| (shop_id, backtest(&model, series, train_length)))
                .collect()
        } else {
            columns
                .into_iter()
                .map(|(shop_id, series)| (shop_id, backtest(&model, series, train_length)))
                .collect()
        };
        Ok(reports)
    }
}
