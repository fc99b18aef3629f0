//! # Shopcast
//!
//! Workspace facade for monthly shop sales forecasting.
//!
//! - [`series_math`]: accuracy metrics, bounded Nelder-Mead and unit rounding
//! - [`sales_forecast`]: data preparation, Holt-Winters forecasting,
//!   backtesting and item disaggregation
//!
//! ## Example
//!
//! ```
//! use shopcast_workspace::sales_forecast::periods::next_n_periods;
//!
//! let periods = next_n_periods("2021-11", 3).unwrap();
//! assert_eq!(periods, vec!["2021-12", "2022-01", "2022-02"]);
//! ```

pub use sales_forecast;
pub use series_math;

/// Version of the workspace facade
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
