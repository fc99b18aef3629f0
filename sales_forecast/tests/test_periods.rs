use pretty_assertions::assert_eq;
use rstest::rstest;
use sales_forecast::error::ForecastError;
use sales_forecast::periods::{next_n_periods, Period};

#[rstest]
#[case("2021-12", 1, vec!["2022-01"])]
#[case("2015-10", 3, vec!["2015-11", "2015-12", "2016-01"])]
#[case("2013-01", 2, vec!["2013-02", "2013-03"])]
fn test_next_n_periods(#[case] start: &str, #[case] n: usize, #[case] expected: Vec<&str>) {
    assert_eq!(next_n_periods(start, n).unwrap(), expected);
}

#[test]
fn test_twelve_periods_cover_a_year() {
    let periods = next_n_periods("2020-06", 12).unwrap();
    assert_eq!(periods.len(), 12);
    assert_eq!(periods.first().unwrap(), "2020-07");
    assert_eq!(periods.last().unwrap(), "2021-06");
}

#[rstest]
#[case("2021-13")]
#[case("2021-00")]
#[case("21-01")]
#[case("2021/01")]
#[case("2021-1")]
#[case("")]
fn test_invalid_period_labels(#[case] label: &str) {
    assert!(matches!(
        next_n_periods(label, 1),
        Err(ForecastError::InvalidPeriodFormat(_))
    ));
}

#[test]
fn test_zero_periods_rejected() {
    assert!(matches!(
        next_n_periods("2021-01", 0),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_period_display_round_trip() {
    let period = Period::new(2009, 3).unwrap();
    assert_eq!(period.to_string(), "2009-03");
    assert_eq!("2009-03".parse::<Period>().unwrap(), period);
}
