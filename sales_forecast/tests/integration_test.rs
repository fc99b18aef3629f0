use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sales_forecast::data::{write_final_forecast, write_json, TrainingMatrix};
use sales_forecast::pipeline::ForecastPipeline;
use sales_forecast::prep::{aggregate_monthly, prepare, PreparedData, Transaction};
use sales_forecast::shares::{ItemShareRecord, ItemShareTable, ShareStrategy};
use sales_forecast::{ForecastConfig, ForecastError, Period};
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

fn tx(year: i32, month: u32, shop_id: u32, item_id: u32, count: f64) -> Transaction {
    Transaction {
        date: NaiveDate::from_ymd_opt(year, month, 10).unwrap(),
        shop_id,
        item_id,
        item_price: 250.0,
        item_cnt_day: count,
    }
}

// Two shops with sales in all 24 months of 2014-2015 and one that closes
// after six months.
fn sample_transactions() -> Vec<Transaction> {
    let mut transactions = Vec::new();
    for year in [2014, 2015] {
        for month in 1..=12u32 {
            let season = (month % 6) as f64;
            transactions.push(tx(year, month, 1, 10, 4.0 + season));
            transactions.push(tx(year, month, 1, 11, 2.0));
            transactions.push(tx(year, month, 2, 10, 1.0 + season / 2.0));
            transactions.push(tx(year, month, 2, 20, 6.0));
            if year == 2014 && month <= 6 {
                transactions.push(tx(year, month, 3, 30, 5.0));
            }
        }
    }
    transactions
}

fn generated_on() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 1, 5).unwrap()
}

fn matrix(columns: BTreeMap<u32, Vec<f64>>) -> TrainingMatrix {
    let n = columns.values().next().map_or(0, Vec::len);
    let start: Period = "2014-01".parse().unwrap();
    let mut periods = vec![start];
    periods.extend(start.next_n(n - 1).unwrap());
    TrainingMatrix::new(periods, columns).unwrap()
}

fn seasonal(n: usize, base: f64) -> Vec<f64> {
    (0..n).map(|t| base + (t % 12) as f64).collect()
}

#[test]
fn test_full_forecast_workflow() {
    // 1. Aggregate and prepare
    let monthly = aggregate_monthly(&sample_transactions());
    let config = ForecastConfig {
        horizon: 3,
        ..ForecastConfig::default()
    };
    let prepared = prepare(&monthly, &config.prep, config.share_strategy).unwrap();
    assert_eq!(prepared.matrix.len(), 24);
    assert_eq!(prepared.excluded_shops, vec![3]);

    // 2. Forecast
    let run = ForecastPipeline::new(config)
        .with_generated_on(generated_on())
        .run(&prepared)
        .unwrap();
    assert_eq!(run.report.forecast_shops, vec![1, 2]);
    assert!(run.report.failed_shops.is_empty());

    let labels: Vec<String> = run
        .forecast_table
        .periods()
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(labels, vec!["2016-01", "2016-02", "2016-03"]);

    // 3. Every catalog item of every shop gets a row per period
    assert_eq!(run.rows.len(), 4 * 3);
    assert!(run.rows.iter().all(|r| r.shop_id != 3));

    // 4. Write output
    let dir = tempdir().unwrap();
    let path = write_final_forecast(
        dir.path(),
        &run.rows,
        run.report.generated_on,
        run.report.horizon,
    )
    .unwrap();
    write_json(path.with_extension("json"), &run.report).unwrap();

    assert!(path.ends_with("sales_prediction_2016-01-05_3.csv"));
    let report = fs::read_to_string(path.with_extension("json")).unwrap();
    assert!(report.contains("\"excluded_shops\""));
}

#[test]
fn test_shop_without_sales_in_share_window_gets_no_item_rows() {
    // Shop 2's only December 2015 row sells 40 units and is filtered out.
    let transactions: Vec<Transaction> = sample_transactions()
        .into_iter()
        .filter(|t| t.shop_id != 3)
        .filter(|t| !(t.shop_id == 2 && t.date.format("%Y-%m").to_string() == "2015-12"))
        .chain([tx(2015, 12, 2, 20, 40.0)])
        .collect();
    let monthly = aggregate_monthly(&transactions);
    let config = ForecastConfig {
        horizon: 6,
        ..ForecastConfig::default()
    };
    let prepared = prepare(&monthly, &config.prep, config.share_strategy).unwrap();
    assert_eq!(prepared.zero_share_shops, vec![2]);
    assert_eq!(prepared.shares.shop_records(2).count(), 0);
    let shop_one_total: f64 = prepared.shares.shop_records(1).map(|r| r.item_share).sum();
    assert!((shop_one_total - 1.0).abs() < 1e-12);

    let run = ForecastPipeline::new(config)
        .with_generated_on(generated_on())
        .run(&prepared)
        .unwrap();
    assert_eq!(run.report.forecast_shops, vec![1, 2]);
    assert_eq!(run.report.zero_share_shops, vec![2]);
    assert_eq!(run.report.shops_without_shares, vec![2]);
    assert!(run.rows.iter().all(|r| r.shop_id == 1));
    assert_eq!(run.rows.len(), 2 * 6);

    // item rows rebuild the shop forecast within rounding
    for (row, period) in run.forecast_table.periods().iter().enumerate() {
        let items: u64 = run
            .rows
            .iter()
            .filter(|r| r.period == *period)
            .map(|r| r.item_cnt_month)
            .sum();
        let shop = run.forecast_table.value(1, row).unwrap();
        assert!((items as f64 - shop as f64).abs() <= 2.0 * 0.5);
    }
}

#[test]
fn test_parallel_and_sequential_runs_agree() {
    let monthly = aggregate_monthly(&sample_transactions());
    let prep = ForecastConfig::default().prep;
    let prepared = prepare(&monthly, &prep, ShareStrategy::TrailingAverage { window: 3 }).unwrap();

    let parallel = ForecastPipeline::new(ForecastConfig::default())
        .with_generated_on(generated_on())
        .run(&prepared)
        .unwrap();
    let sequential = ForecastPipeline::new(ForecastConfig {
        parallel: false,
        ..ForecastConfig::default()
    })
    .with_generated_on(generated_on())
    .run(&prepared)
    .unwrap();

    assert_eq!(parallel.forecast_table, sequential.forecast_table);
    assert_eq!(parallel.rows, sequential.rows);
}

#[test]
fn test_failing_shop_is_excluded() {
    let mut columns = BTreeMap::new();
    columns.insert(1, seasonal(24, 20.0));
    let mut broken = seasonal(24, 20.0);
    broken[7] = -3.0;
    columns.insert(2, broken);

    let shares = ItemShareTable::from_records([
        ItemShareRecord {
            shop_id: 1,
            item_id: 5,
            item_cnt_month: 10.0,
            item_share: 1.0,
        },
        ItemShareRecord {
            shop_id: 2,
            item_id: 6,
            item_cnt_month: 10.0,
            item_share: 1.0,
        },
    ]);
    let prepared = PreparedData::from_parts(matrix(columns), shares);

    let run = ForecastPipeline::new(ForecastConfig::default())
        .run(&prepared)
        .unwrap();
    assert_eq!(run.report.forecast_shops, vec![1]);
    assert_eq!(run.report.failed_shops.len(), 1);
    assert_eq!(run.report.failed_shops[0].shop_id, 2);
    assert!(run.rows.iter().all(|r| r.shop_id == 1));
    assert_eq!(run.rows.len(), 6);
}

#[test]
fn test_no_successful_forecast_is_an_error() {
    let mut columns = BTreeMap::new();
    columns.insert(1, seasonal(8, 20.0));
    columns.insert(2, seasonal(8, 30.0));
    let prepared = PreparedData::from_parts(matrix(columns), ItemShareTable::default());

    let result = ForecastPipeline::new(ForecastConfig::default()).run(&prepared);
    assert!(matches!(
        result,
        Err(ForecastError::NoSuccessfulForecasts { failed: 2 })
    ));
}

#[test]
fn test_backtest_every_shop() {
    let mut columns = BTreeMap::new();
    columns.insert(1, seasonal(34, 20.0));
    columns.insert(2, seasonal(20, 5.0).into_iter().chain(vec![1.0; 14]).collect());
    let pipeline = ForecastPipeline::new(ForecastConfig::default());

    let reports = pipeline.backtest_matrix(&matrix(columns)).unwrap();
    assert_eq!(reports.len(), 2);
    let exact = reports[&1].as_ref().unwrap();
    assert_eq!(exact.predictions.len(), 8);
    assert!(exact.mae < 1e-9);
    assert!(reports[&2].as_ref().unwrap().mae > 0.0);
}
