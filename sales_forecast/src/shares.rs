//! Item shares of shop sales
//!
//! An item's share is its fraction of the shop's unit sales over the share
//! window. Every item in the shop's catalog gets a share, zero when it did
//! not sell in the window, so the shares of a shop sum to one.

use crate::error::{ForecastError, Result};
use crate::periods::Period;
use crate::prep::MonthlySales;
use crate::{ItemId, ShopId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Which history the shares are computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShareStrategy {
    /// The last training period only
    #[default]
    MostRecent,
    /// Item counts summed over the last `window` training periods
    TrailingAverage { window: usize },
}

impl ShareStrategy {
    fn window(&self) -> Result<usize> {
        match *self {
            ShareStrategy::MostRecent => Ok(1),
            ShareStrategy::TrailingAverage { window } if window >= 1 => Ok(window),
            ShareStrategy::TrailingAverage { .. } => Err(ForecastError::InvalidParameter(
                "Share window must cover at least one period".to_string(),
            )),
        }
    }
}

/// Share of one item in its shop's sales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemShareRecord {
    pub shop_id: ShopId,
    pub item_id: ItemId,
    /// Units sold in the share window
    pub item_cnt_month: f64,
    pub item_share: f64,
}

/// Known `(shop, item)` pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemCatalog {
    items: BTreeMap<ShopId, BTreeSet<ItemId>>,
}

impl ItemCatalog {
    pub fn from_pairs<I: IntoIterator<Item = (ShopId, ItemId)>>(pairs: I) -> Self {
        let mut items: BTreeMap<ShopId, BTreeSet<ItemId>> = BTreeMap::new();
        for (shop_id, item_id) in pairs {
            items.entry(shop_id).or_default().insert(item_id);
        }
        Self { items }
    }

    pub fn shops(&self) -> impl Iterator<Item = ShopId> + '_ {
        self.items.keys().copied()
    }

    pub fn items(&self, shop_id: ShopId) -> impl Iterator<Item = ItemId> + '_ {
        self.items.get(&shop_id).into_iter().flatten().copied()
    }

    pub fn contains(&self, shop_id: ShopId, item_id: ItemId) -> bool {
        self.items
            .get(&shop_id)
            .is_some_and(|items| items.contains(&item_id))
    }

    /// Number of `(shop, item)` pairs
    pub fn len(&self) -> usize {
        self.items.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Item shares grouped by shop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemShareTable {
    by_shop: BTreeMap<ShopId, BTreeMap<ItemId, ItemShareRecord>>,
}

impl ItemShareTable {
    /// Table holding exactly the given records
    pub fn from_records<I: IntoIterator<Item = ItemShareRecord>>(records: I) -> Self {
        let mut by_shop: BTreeMap<ShopId, BTreeMap<ItemId, ItemShareRecord>> = BTreeMap::new();
        for record in records {
            by_shop
                .entry(record.shop_id)
                .or_default()
                .insert(record.item_id, record);
        }
        Self { by_shop }
    }

    /// Table covering every catalog pair; pairs without a record get share 0
    pub fn with_catalog<I: IntoIterator<Item = ItemShareRecord>>(
        catalog: &ItemCatalog,
        records: I,
    ) -> Self {
        let mut table = Self::from_records(records);
        for shop_id in catalog.shops() {
            let items = table.by_shop.entry(shop_id).or_default();
            for item_id in catalog.items(shop_id) {
                items.entry(item_id).or_insert(ItemShareRecord {
                    shop_id,
                    item_id,
                    item_cnt_month: 0.0,
                    item_share: 0.0,
                });
            }
        }
        table
    }

    /// Share of an item, 0 when unknown
    pub fn share(&self, shop_id: ShopId, item_id: ItemId) -> f64 {
        self.by_shop
            .get(&shop_id)
            .and_then(|items| items.get(&item_id))
            .map_or(0.0, |record| record.item_share)
    }

    pub fn shops(&self) -> impl Iterator<Item = ShopId> + '_ {
        self.by_shop.keys().copied()
    }

    /// Records of one shop, ordered by item id
    pub fn shop_records(&self, shop_id: ShopId) -> impl Iterator<Item = &ItemShareRecord> + '_ {
        self.by_shop.get(&shop_id).into_iter().flat_map(|items| items.values())
    }

    /// All records, ordered by shop then item
    pub fn records(&self) -> impl Iterator<Item = &ItemShareRecord> + '_ {
        self.by_shop.values().flat_map(|items| items.values())
    }

    pub fn len(&self) -> usize {
        self.by_shop.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shares of one shop's items from their unit counts.
///
/// Fails with `DivisionByZero` when the shop sold nothing.
pub fn shop_shares(shop_id: ShopId, counts: &BTreeMap<ItemId, f64>) -> Result<Vec<ItemShareRecord>> {
    let total: f64 = counts.values().sum();
    if total <= 0.0 {
        return Err(ForecastError::DivisionByZero(format!(
            "shop {} has no unit sales in the share window",
            shop_id
        )));
    }

    Ok(counts
        .iter()
        .map(|(&item_id, &count)| ItemShareRecord {
            shop_id,
            item_id,
            item_cnt_month: count,
            item_share: count / total,
        })
        .collect())
}

/// Shares built for every catalog shop, with the shops that could not be shared
#[derive(Debug, Clone, Default)]
pub struct ShareBuild {
    pub table: ItemShareTable,
    /// Shops whose share window holds no sales
    pub zero_total_shops: Vec<ShopId>,
}

/// Compute item shares for every catalog shop from monthly sales.
///
/// The share window ends at `last_period` and spans the number of calendar
/// months given by `strategy`.
pub fn build_item_shares(
    monthly: &[MonthlySales],
    catalog: &ItemCatalog,
    strategy: ShareStrategy,
    last_period: Period,
) -> Result<ShareBuild> {
    let window = strategy.window()?;
    let mut window_periods = BTreeSet::new();
    let mut period = last_period;
    window_periods.insert(period);
    for _ in 1..window {
        period = period.pred()?;
        window_periods.insert(period);
    }

    let mut counts: BTreeMap<ShopId, BTreeMap<ItemId, f64>> = BTreeMap::new();
    for shop_id in catalog.shops() {
        let items = counts.entry(shop_id).or_default();
        for item_id in catalog.items(shop_id) {
            items.insert(item_id, 0.0);
        }
    }
    for row in monthly
        .iter()
        .filter(|row| window_periods.contains(&row.period))
    {
        if let Some(items) = counts.get_mut(&row.shop_id) {
            *items.entry(row.item_id).or_insert(0.0) += row.item_cnt_month;
        }
    }

    let mut build = ShareBuild::default();
    let mut records = Vec::new();
    for (shop_id, items) in &counts {
        match shop_shares(*shop_id, items) {
            Ok(shop_records) => records.extend(shop_records),
            Err(ForecastError::DivisionByZero(reason)) => {
                warn!(shop_id = *shop_id, %reason, "Skipping item shares");
                build.zero_total_shops.push(*shop_id);
            }
            Err(err) => return Err(err),
        }
    }
    build.table = ItemShareTable::from_records(records);

    Ok(build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_shop_shares_sum_to_one() {
        let counts: BTreeMap<ItemId, f64> = [(1, 7.0), (2, 3.0), (3, 0.0)].into_iter().collect();
        let records = shop_shares(5, &counts).unwrap();
        let total: f64 = records.iter().map(|r| r.item_share).sum();
        assert_approx_eq!(total, 1.0, 1e-12);
        assert_eq!(records[2].item_share, 0.0);
    }

    #[test]
    fn test_shop_without_sales_is_division_by_zero() {
        let counts: BTreeMap<ItemId, f64> = [(1, 0.0)].into_iter().collect();
        assert!(matches!(
            shop_shares(5, &counts),
            Err(ForecastError::DivisionByZero(_))
        ));
    }

    #[test]
    fn test_missing_catalog_pairs_get_zero_share() {
        let catalog = ItemCatalog::from_pairs([(1, 10), (1, 11)]);
        let table = ItemShareTable::with_catalog(
            &catalog,
            [ItemShareRecord {
                shop_id: 1,
                item_id: 10,
                item_cnt_month: 4.0,
                item_share: 1.0,
            }],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.share(1, 11), 0.0);
        assert_eq!(table.share(9, 99), 0.0);
    }

    #[test]
    fn test_zero_window_rejected() {
        let strategy = ShareStrategy::TrailingAverage { window: 0 };
        assert!(matches!(
            strategy.window(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    fn sale(period: &str, shop_id: ShopId, item_id: ItemId, count: f64) -> MonthlySales {
        MonthlySales {
            period: period.parse().unwrap(),
            shop_id,
            item_id,
            item_cnt_month: count,
            item_price_mavg: 100.0,
        }
    }

    fn history() -> (Vec<MonthlySales>, ItemCatalog) {
        let monthly = vec![
            sale("2020-09", 1, 11, 100.0),
            sale("2020-10", 1, 10, 6.0),
            sale("2020-10", 1, 12, 2.0),
            sale("2020-10", 2, 20, 5.0),
            sale("2020-11", 1, 10, 2.0),
            sale("2020-11", 1, 11, 2.0),
            sale("2020-12", 1, 10, 3.0),
            sale("2020-12", 1, 11, 1.0),
        ];
        let catalog = ItemCatalog::from_pairs([(1, 10), (1, 11), (1, 12), (2, 20)]);
        (monthly, catalog)
    }

    fn shop_total(table: &ItemShareTable, shop_id: ShopId) -> f64 {
        table.shop_records(shop_id).map(|r| r.item_share).sum()
    }

    #[test]
    fn test_most_recent_shares() {
        let (monthly, catalog) = history();
        let build = build_item_shares(
            &monthly,
            &catalog,
            ShareStrategy::MostRecent,
            "2020-12".parse().unwrap(),
        )
        .unwrap();

        assert_approx_eq!(build.table.share(1, 10), 0.75, 1e-12);
        assert_approx_eq!(build.table.share(1, 11), 0.25, 1e-12);
        assert_eq!(build.table.share(1, 12), 0.0);
        assert_eq!(build.table.shop_records(1).count(), 3);
        assert_approx_eq!(shop_total(&build.table, 1), 1.0, 1e-12);

        // shop 2 sold nothing in the last month
        assert_eq!(build.zero_total_shops, vec![2]);
        assert_eq!(build.table.shop_records(2).count(), 0);
    }

    #[test]
    fn test_trailing_window_shares() {
        let (monthly, catalog) = history();
        let build = build_item_shares(
            &monthly,
            &catalog,
            ShareStrategy::TrailingAverage { window: 3 },
            "2020-12".parse().unwrap(),
        )
        .unwrap();

        // 2020-09 is outside the window
        assert_approx_eq!(build.table.share(1, 10), 11.0 / 16.0, 1e-12);
        assert_approx_eq!(build.table.share(1, 11), 3.0 / 16.0, 1e-12);
        assert_approx_eq!(build.table.share(1, 12), 2.0 / 16.0, 1e-12);
        assert_approx_eq!(shop_total(&build.table, 1), 1.0, 1e-12);
        assert_approx_eq!(build.table.share(2, 20), 1.0, 1e-12);
        assert!(build.zero_total_shops.is_empty());
    }

    #[test]
    fn test_window_crosses_year_boundary() {
        let (monthly, catalog) = history();
        let build = build_item_shares(
            &monthly,
            &catalog,
            ShareStrategy::TrailingAverage { window: 2 },
            "2021-01".parse().unwrap(),
        )
        .unwrap();

        assert_approx_eq!(build.table.share(1, 10), 0.75, 1e-12);
        assert_approx_eq!(build.table.share(1, 11), 0.25, 1e-12);
        assert_eq!(build.zero_total_shops, vec![2]);
    }
}
