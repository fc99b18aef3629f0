//! Tabular data at the boundary of the engine
//!
//! The wide tables (training matrix, forecast table) travel as polars
//! `DataFrame`s so any charting or reporting collaborator can consume them.
//! Row-shaped files (shares, transactions, final forecast) go through
//! `csv` and serde.

use crate::disaggregation::FinalForecastRow;
use crate::error::{ForecastError, Result};
use crate::periods::{ensure_contiguous, Period};
use crate::prep::Transaction;
use crate::shares::ItemShareRecord;
use crate::ShopId;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Name of the period column in wide tables
pub const PERIOD_COLUMN: &str = "period";

/// Monthly unit sales, one column per shop, over contiguous periods
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingMatrix {
    periods: Vec<Period>,
    columns: BTreeMap<ShopId, Vec<f64>>,
}

/// Rounded shop forecasts, one column per shop, over future periods
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTable {
    periods: Vec<Period>,
    columns: BTreeMap<ShopId, Vec<u64>>,
}

/// Data loader for the engine's input files
#[derive(Debug)]
pub struct DataLoader;

fn check_shape<T>(periods: &[Period], columns: &BTreeMap<ShopId, Vec<T>>) -> Result<()> {
    if periods.is_empty() {
        return Err(ForecastError::DataError(
            "Table has no periods".to_string(),
        ));
    }
    if let Some((shop_id, column)) = columns.iter().find(|(_, c)| c.len() != periods.len()) {
        return Err(ForecastError::DataError(format!(
            "Column for shop {} has {} values, expected {}",
            shop_id,
            column.len(),
            periods.len()
        )));
    }
    Ok(())
}

fn period_series(periods: &[Period]) -> Series {
    Series::new(
        PERIOD_COLUMN,
        periods.iter().map(|p| p.to_string()).collect::<Vec<String>>(),
    )
}

impl TrainingMatrix {
    /// Create a matrix; periods must be contiguous and every column complete
    pub fn new(periods: Vec<Period>, columns: BTreeMap<ShopId, Vec<f64>>) -> Result<Self> {
        check_shape(&periods, &columns)?;
        ensure_contiguous(&periods)?;
        Ok(Self { periods, columns })
    }

    /// Read a matrix from a `period` column plus one column per shop id
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let period_column = df.column(PERIOD_COLUMN).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", PERIOD_COLUMN, e))
        })?;
        let periods = period_column
            .cast(&DataType::Utf8)?
            .utf8()?
            .into_iter()
            .map(|label| {
                label
                    .ok_or_else(|| ForecastError::DataError("Missing period label".to_string()))?
                    .parse::<Period>()
            })
            .collect::<Result<Vec<Period>>>()?;

        let mut columns = BTreeMap::new();
        for series in df.get_columns() {
            if series.name() == PERIOD_COLUMN {
                continue;
            }
            let shop_id: ShopId = series.name().trim().parse().map_err(|_| {
                ForecastError::DataError(format!("Column '{}' is not a shop id", series.name()))
            })?;
            let values = series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| {
                    v.ok_or_else(|| {
                        ForecastError::DataError(format!("Missing value for shop {}", shop_id))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            columns.insert(shop_id, values);
        }

        Self::new(periods, columns)
    }

    /// Wide `DataFrame`: `period` then one column per shop
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut series = vec![period_series(&self.periods)];
        for (shop_id, values) in &self.columns {
            series.push(Series::new(&shop_id.to_string(), values.clone()));
        }
        Ok(DataFrame::new(series)?)
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Last observed period
    pub fn last_period(&self) -> Period {
        // non-empty by construction
        self.periods[self.periods.len() - 1]
    }

    pub fn shops(&self) -> impl Iterator<Item = ShopId> + '_ {
        self.columns.keys().copied()
    }

    /// Series of one shop
    pub fn series(&self, shop_id: ShopId) -> Option<&[f64]> {
        self.columns.get(&shop_id).map(Vec::as_slice)
    }

    /// `(shop, series)` pairs ordered by shop id
    pub fn columns(&self) -> impl Iterator<Item = (ShopId, &[f64])> + '_ {
        self.columns.iter().map(|(id, v)| (*id, v.as_slice()))
    }

    /// Number of periods
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn shop_count(&self) -> usize {
        self.columns.len()
    }
}

impl ForecastTable {
    /// Create a forecast table; every column must cover every period
    pub fn new(periods: Vec<Period>, columns: BTreeMap<ShopId, Vec<u64>>) -> Result<Self> {
        check_shape(&periods, &columns)?;
        Ok(Self { periods, columns })
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Number of forecast periods
    pub fn horizon(&self) -> usize {
        self.periods.len()
    }

    pub fn shops(&self) -> impl Iterator<Item = ShopId> + '_ {
        self.columns.keys().copied()
    }

    pub fn column(&self, shop_id: ShopId) -> Option<&[u64]> {
        self.columns.get(&shop_id).map(Vec::as_slice)
    }

    /// Forecast of one shop at row `row`
    pub fn value(&self, shop_id: ShopId, row: usize) -> Option<u64> {
        self.columns.get(&shop_id).and_then(|c| c.get(row)).copied()
    }

    /// Forecast of one shop for a period
    pub fn get(&self, shop_id: ShopId, period: Period) -> Option<u64> {
        let row = self.periods.iter().position(|p| *p == period)?;
        self.value(shop_id, row)
    }

    /// Wide `DataFrame`: `period` then one column per shop
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut series = vec![period_series(&self.periods)];
        for (shop_id, values) in &self.columns {
            series.push(Series::new(&shop_id.to_string(), values.clone()));
        }
        Ok(DataFrame::new(series)?)
    }
}

impl DataLoader {
    /// Load a wide training matrix from CSV
    pub fn training_matrix_from_csv<P: AsRef<Path>>(path: P) -> Result<TrainingMatrix> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        TrainingMatrix::from_dataframe(&df)
    }

    /// Load item share rows (`shop_id,item_id,item_cnt_month,item_share`)
    pub fn item_shares_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<ItemShareRecord>> {
        read_rows(path)
    }

    /// Load daily transactions (`date,shop_id,item_id,item_price,item_cnt_day`)
    pub fn transactions_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>> {
        read_rows(path)
    }
}

fn read_rows<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<T>, csv::Error>>()?;
    Ok(rows)
}

/// File name of a forecast generated on `generated_on` for `horizon` periods
pub fn forecast_file_name(generated_on: NaiveDate, horizon: usize) -> String {
    format!(
        "sales_prediction_{}_{}.csv",
        generated_on.format("%Y-%m-%d"),
        horizon
    )
}

/// Write the final item forecast into `dir` and return its path.
///
/// Rows are written to a temporary file first and renamed into place, so
/// readers never see a partial file.
pub fn write_final_forecast<P: AsRef<Path>>(
    dir: P,
    rows: &[FinalForecastRow],
    generated_on: NaiveDate,
    horizon: usize,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(forecast_file_name(generated_on, horizon));
    write_rows_atomically(&path, rows)?;
    Ok(path)
}

/// Write a serializable value as pretty JSON
pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

fn write_rows_atomically<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let staging = path.with_extension("csv.partial");
    {
        let mut writer = csv::Writer::from_path(&staging)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&staging, path)?;
    Ok(())
}
