//! # Sales Forecast
//!
//! A Rust library for monthly shop-level sales forecasting with item-level
//! disaggregation.
//!
//! ## Features
//!
//! - Monthly aggregation of daily transactions with outlier filters
//! - Completeness filter keeping shops with sales in every period
//! - Additive-seasonal Holt-Winters with optimized coefficients
//! - Seasonal naive and last-value fallbacks for fits that exceed their budget
//! - Train/test backtesting with MAE and RMSE
//! - Item shares (most recent month or trailing window) and disaggregation
//! - Parallel per-shop fitting on the rayon pool
//!
//! ## Pipeline
//!
//! ```text
//! transactions -> aggregate_monthly -> prepare -> ForecastPipeline::run -> write_final_forecast
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sales_forecast::data::{write_final_forecast, DataLoader};
//! use sales_forecast::pipeline::ForecastPipeline;
//! use sales_forecast::prep::{aggregate_monthly, prepare};
//! use sales_forecast::ForecastConfig;
//!
//! # fn main() -> sales_forecast::Result<()> {
//! let config = ForecastConfig::default();
//!
//! // Load daily sales and build the training matrix
//! let transactions = DataLoader::transactions_from_csv("sales_train.csv")?;
//! let monthly = aggregate_monthly(&transactions);
//! let prepared = prepare(&monthly, &config.prep, config.share_strategy)?;
//!
//! // Forecast every complete shop and spread the result over items
//! let run = ForecastPipeline::new(config).run(&prepared)?;
//! let path = write_final_forecast(
//!     "output",
//!     &run.rows,
//!     run.report.generated_on,
//!     run.report.horizon,
//! )?;
//! println!("Wrote {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod backtest;
pub mod completeness;
pub mod config;
pub mod data;
pub mod disaggregation;
pub mod error;
pub mod models;
pub mod periods;
pub mod pipeline;
pub mod prep;
pub mod shares;

/// Shop identifier
pub type ShopId = u32;
/// Item identifier
pub type ItemId = u32;

// Re-export commonly used types
pub use crate::backtest::{backtest, BacktestReport};
pub use crate::completeness::{completeness, CompletenessTable};
pub use crate::config::ForecastConfig;
pub use crate::data::{DataLoader, ForecastTable, TrainingMatrix};
pub use crate::disaggregation::{disaggregate, FinalForecastRow};
pub use crate::error::{ForecastError, Result};
pub use crate::models::{ForecastModel, ForecastResult, HoltWinters, HoltWintersFit};
pub use crate::periods::{next_n_periods, Period};
pub use crate::pipeline::{ForecastPipeline, ForecastRun, RunReport};
pub use crate::shares::{ItemShareTable, ShareStrategy};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
