//! Disaggregation of shop forecasts into item forecasts
//!
//! Each shop forecast is spread over the shop's items in proportion to
//! their shares: `item_cnt_month = round_half_up(shop_forecast * share)`.

use crate::data::ForecastTable;
use crate::periods::Period;
use crate::shares::ItemShareTable;
use crate::{ItemId, ShopId};
use serde::{Deserialize, Serialize};
use series_math::round_units;
use tracing::warn;

/// One item forecast for one future period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalForecastRow {
    pub period: Period,
    pub shop_id: ShopId,
    pub item_id: ItemId,
    pub item_cnt_month: u64,
}

/// Shop forecast in long form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopForecast {
    pub period: Period,
    pub shop_id: ShopId,
    pub month_sales: u64,
}

/// Reshape a forecast table into `(period, shop, value)` rows
pub fn melt(table: &ForecastTable) -> Vec<ShopForecast> {
    table
        .periods()
        .iter()
        .enumerate()
        .flat_map(|(row, &period)| {
            table.shops().map(move |shop_id| ShopForecast {
                period,
                shop_id,
                month_sales: table.value(shop_id, row).unwrap_or(0),
            })
        })
        .collect()
}

/// Spread every shop forecast over the shop's items.
///
/// Rows are ordered by shop, item, then period. Shops without share
/// records produce no rows.
pub fn disaggregate(table: &ForecastTable, shares: &ItemShareTable) -> Vec<FinalForecastRow> {
    let mut rows = Vec::with_capacity(shares.len() * table.horizon());

    for shop_id in table.shops() {
        let Some(column) = table.column(shop_id) else {
            continue;
        };
        let mut records = shares.shop_records(shop_id).peekable();
        if records.peek().is_none() {
            warn!(shop_id, "Forecast shop has no item shares; no item rows produced");
            continue;
        }

        for record in records {
            for (&period, &month_sales) in table.periods().iter().zip(column) {
                rows.push(FinalForecastRow {
                    period,
                    shop_id,
                    item_id: record.item_id,
                    item_cnt_month: round_units(month_sales as f64 * record.item_share),
                });
            }
        }
    }

    rows
}
