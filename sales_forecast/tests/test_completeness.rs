use assert_approx_eq::assert_approx_eq;
use sales_forecast::completeness::completeness;
use sales_forecast::error::ForecastError;
use sales_forecast::periods::Period;

fn p(label: &str) -> Period {
    label.parse().unwrap()
}

#[test]
fn test_fraction_of_periods_with_sales() {
    let pairs = vec![
        (p("2020-01"), 1u32),
        (p("2020-02"), 1),
        (p("2020-03"), 1),
        (p("2020-04"), 1),
        (p("2020-01"), 2),
        (p("2020-03"), 2),
    ];
    let table = completeness(pairs).unwrap();

    assert_eq!(table.total_periods(), 4);
    assert_approx_eq!(table.fraction(&1).unwrap(), 1.0);
    assert_approx_eq!(table.fraction(&2).unwrap(), 0.5);
    assert_eq!(table.complete_entities(), vec![1]);
    assert_eq!(table.incomplete_entities(), vec![2]);
}

#[test]
fn test_duplicate_rows_counted_once() {
    let pairs = vec![
        (p("2020-01"), 7u32),
        (p("2020-01"), 7),
        (p("2020-01"), 7),
        (p("2020-02"), 8),
    ];
    let table = completeness(pairs).unwrap();
    assert_approx_eq!(table.fraction(&7).unwrap(), 0.5);
    assert!(!table.is_complete(&7));
}

#[test]
fn test_empty_input_is_division_by_zero() {
    let pairs: Vec<(Period, u32)> = Vec::new();
    assert!(matches!(
        completeness(pairs),
        Err(ForecastError::DivisionByZero(_))
    ));
}
