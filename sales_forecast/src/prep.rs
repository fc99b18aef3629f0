//! Preparation of daily transactions into forecastable monthly data
//!
//! Daily rows are cleaned and summed per month. Shops with sales in every
//! month become the training matrix; the rest are reported as excluded.
//! Item shares are computed for the shops that stay.

use crate::completeness::completeness;
use crate::data::TrainingMatrix;
use crate::error::{ForecastError, Result};
use crate::periods::Period;
use crate::shares::{build_item_shares, ItemCatalog, ItemShareTable, ShareStrategy};
use crate::{ItemId, ShopId};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// One day of sales of one item in one shop
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    #[serde(deserialize_with = "deserialize_day")]
    pub date: NaiveDate,
    pub shop_id: ShopId,
    pub item_id: ItemId,
    pub item_price: f64,
    pub item_cnt_day: f64,
}

/// Monthly sales of one item in one shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySales {
    pub period: Period,
    pub shop_id: ShopId,
    pub item_id: ItemId,
    pub item_cnt_month: f64,
    /// Mean of the daily prices in the month
    pub item_price_mavg: f64,
}

/// Outlier thresholds applied to monthly rows; `None` disables a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Monthly rows must sell fewer units than this
    pub item_monthly_sale_limit: Option<f64>,
    /// Monthly mean price must be below this
    pub item_monthly_avg_price_limit: Option<f64>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            item_monthly_sale_limit: Some(15.0),
            item_monthly_avg_price_limit: Some(6000.0),
        }
    }
}

impl PrepConfig {
    /// Configuration that keeps every monthly row
    pub fn unfiltered() -> Self {
        Self {
            item_monthly_sale_limit: None,
            item_monthly_avg_price_limit: None,
        }
    }

    fn keeps(&self, row: &MonthlySales) -> bool {
        self.item_monthly_sale_limit
            .map_or(true, |limit| row.item_cnt_month < limit)
            && self
                .item_monthly_avg_price_limit
                .map_or(true, |limit| row.item_price_mavg < limit)
    }
}

/// Inputs of a forecast run
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Monthly unit sales of complete shops
    pub matrix: TrainingMatrix,
    pub shares: ItemShareTable,
    pub catalog: ItemCatalog,
    /// Shops without sales in every period
    pub excluded_shops: Vec<ShopId>,
    /// Items with sales in every period
    pub complete_items: Vec<ItemId>,
    /// Complete shops whose share window holds no sales
    pub zero_share_shops: Vec<ShopId>,
}

impl PreparedData {
    /// Wrap an already prepared matrix and share table
    pub fn from_parts(matrix: TrainingMatrix, shares: ItemShareTable) -> Self {
        let catalog = ItemCatalog::from_pairs(shares.records().map(|r| (r.shop_id, r.item_id)));
        Self {
            matrix,
            shares,
            catalog,
            excluded_shops: Vec::new(),
            complete_items: Vec::new(),
            zero_share_shops: Vec::new(),
        }
    }
}

/// Sum daily transactions per month, dropping rows with negative or
/// non-finite counts or prices.
pub fn aggregate_monthly(transactions: &[Transaction]) -> Vec<MonthlySales> {
    let mut groups: BTreeMap<(Period, ShopId, ItemId), (f64, f64, usize)> = BTreeMap::new();
    let mut dropped = 0usize;

    for tx in transactions {
        let valid = tx.item_cnt_day.is_finite()
            && tx.item_cnt_day >= 0.0
            && tx.item_price.is_finite()
            && tx.item_price >= 0.0;
        if !valid {
            dropped += 1;
            continue;
        }

        let key = (Period::from_date(tx.date), tx.shop_id, tx.item_id);
        let entry = groups.entry(key).or_insert((0.0, 0.0, 0));
        entry.0 += tx.item_cnt_day;
        entry.1 += tx.item_price;
        entry.2 += 1;
    }

    if dropped > 0 {
        warn!(dropped, "Dropped transactions with negative or missing values");
    }

    groups
        .into_iter()
        .map(|((period, shop_id, item_id), (count, price_sum, days))| MonthlySales {
            period,
            shop_id,
            item_id,
            item_cnt_month: count,
            item_price_mavg: price_sum / days as f64,
        })
        .collect()
}

/// Build the training matrix, item catalog and shares from monthly sales.
pub fn prepare(
    monthly: &[MonthlySales],
    config: &PrepConfig,
    strategy: ShareStrategy,
) -> Result<PreparedData> {
    let shop_coverage = completeness(monthly.iter().map(|m| (m.period, m.shop_id)))?;
    let item_coverage = completeness(monthly.iter().map(|m| (m.period, m.item_id)))?;

    let complete_shops: BTreeSet<ShopId> = shop_coverage.complete_entities().into_iter().collect();
    let excluded_shops = shop_coverage.incomplete_entities();
    if complete_shops.is_empty() {
        return Err(ForecastError::DataError(
            "No shop has sales in every period".to_string(),
        ));
    }

    let catalog = ItemCatalog::from_pairs(
        monthly
            .iter()
            .filter(|m| complete_shops.contains(&m.shop_id))
            .map(|m| (m.shop_id, m.item_id)),
    );

    let kept: Vec<MonthlySales> = monthly
        .iter()
        .filter(|m| complete_shops.contains(&m.shop_id) && config.keeps(m))
        .cloned()
        .collect();

    let periods: Vec<Period> = monthly
        .iter()
        .map(|m| m.period)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let position: BTreeMap<Period, usize> =
        periods.iter().enumerate().map(|(i, p)| (*p, i)).collect();

    let mut columns: BTreeMap<ShopId, Vec<f64>> = complete_shops
        .iter()
        .map(|&shop_id| (shop_id, vec![0.0; periods.len()]))
        .collect();
    for row in &kept {
        if let (Some(column), Some(&i)) = (columns.get_mut(&row.shop_id), position.get(&row.period)) {
            column[i] += row.item_cnt_month;
        }
    }
    let matrix = TrainingMatrix::new(periods, columns)?;

    let last_period = matrix.last_period();
    let build = build_item_shares(&kept, &catalog, strategy, last_period)?;
    // zero-fill only shops whose window had sales; the rest stay unshared
    let shared: BTreeSet<ShopId> = build.table.shops().collect();
    let shared_catalog = ItemCatalog::from_pairs(
        catalog
            .shops()
            .filter(|shop_id| shared.contains(shop_id))
            .flat_map(|shop_id| catalog.items(shop_id).map(move |item_id| (shop_id, item_id))),
    );
    let shares = ItemShareTable::with_catalog(&shared_catalog, build.table.records().cloned());

    info!(
        periods = matrix.len(),
        complete_shops = complete_shops.len(),
        excluded_shops = excluded_shops.len(),
        catalog_pairs = catalog.len(),
        dropped_rows = monthly.len() - kept.len(),
        "Prepared monthly training data"
    );

    Ok(PreparedData {
        matrix,
        shares,
        catalog,
        excluded_shops,
        complete_items: item_coverage.complete_entities(),
        zero_share_shops: build.zero_total_shops,
    })
}

fn deserialize_day<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&raw, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(&raw, "%Y-%m-%d"))
        .map_err(serde::de::Error::custom)
}
