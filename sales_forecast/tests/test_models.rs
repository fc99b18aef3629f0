use assert_approx_eq::assert_approx_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use sales_forecast::error::ForecastError;
use sales_forecast::models::holt_winters::{fit, forecast};
use sales_forecast::models::naive::{LastValue, SeasonalNaive};
use sales_forecast::models::{FallbackMethod, ForecastModel, HoltWinters, TrainedForecastModel};

const PATTERN: [f64; 12] = [
    60.0, 48.0, 52.0, 55.0, 50.0, 45.0, 43.0, 47.0, 51.0, 58.0, 70.0, 90.0,
];

fn seasonal_series(cycles: usize) -> Vec<f64> {
    PATTERN.iter().cycle().take(12 * cycles).cloned().collect()
}

fn noisy_series(cycles: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 2.0).unwrap();
    seasonal_series(cycles)
        .into_iter()
        .map(|v| (v + noise.sample(&mut rng)).max(0.0))
        .collect()
}

#[test]
fn test_holt_winters_recovers_noisy_seasonality() {
    let series = noisy_series(3, 42);
    let fitted = fit(&series, 12).unwrap();
    let predictions = forecast(&fitted, 12).unwrap();

    let mae: f64 = predictions
        .iter()
        .zip(PATTERN.iter())
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / 12.0;
    assert!(mae < 8.0, "MAE against the true pattern was {}", mae);
    assert!((0.0..=1.0).contains(&fitted.alpha()));
    assert!((0.0..=1.0).contains(&fitted.gamma()));
}

#[test]
fn test_trained_model_reports_horizon() {
    let model = HoltWinters::new(12).unwrap();
    let trained = model.train(&seasonal_series(2)).unwrap();
    let result = trained.forecast(6).unwrap();

    assert_eq!(result.horizon(), 6);
    assert_eq!(result.values().len(), 6);
    assert_approx_eq!(result.values()[0], PATTERN[0], 1e-9);
    assert_approx_eq!(result.mean_absolute_error(&PATTERN[..6]).unwrap(), 0.0, 1e-9);
}

#[test]
fn test_exactly_one_cycle_is_enough() {
    let fitted = fit(&seasonal_series(1), 12).unwrap();
    let predictions = forecast(&fitted, 12).unwrap();
    for (p, a) in predictions.iter().zip(PATTERN.iter()) {
        assert_approx_eq!(*p, *a, 1e-9);
    }
}

#[test]
fn test_invalid_inputs() {
    assert!(matches!(
        HoltWinters::new(1),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        fit(&[1.0; 11], 12),
        Err(ForecastError::InsufficientData(_))
    ));

    let mut series = seasonal_series(2);
    series[5] = f64::NAN;
    assert!(matches!(fit(&series, 12), Err(ForecastError::DataError(_))));
}

#[test]
fn test_seasonal_naive_repeats_last_cycle() {
    let mut series = seasonal_series(2);
    series[12] = 99.0;
    let trained = SeasonalNaive::new(12).unwrap().train(&series).unwrap();
    let values = trained.forecast(14).unwrap().into_values();

    assert_eq!(values[0], 99.0);
    assert_eq!(values[1], PATTERN[1]);
    assert_eq!(values[12], 99.0);
}

#[test]
fn test_last_value_is_flat() {
    let trained = LastValue.train(&[3.0, 4.0, 7.0]).unwrap();
    assert_eq!(trained.forecast(3).unwrap().into_values(), vec![7.0; 3]);
}

#[test]
fn test_fallback_method_dispatch() {
    let series = seasonal_series(2);
    assert_eq!(
        FallbackMethod::SeasonalNaive.forecast(&series, 12, 2).unwrap(),
        vec![PATTERN[0], PATTERN[1]]
    );
    assert_eq!(
        FallbackMethod::LastValue.forecast(&series, 12, 2).unwrap(),
        vec![PATTERN[11]; 2]
    );
}
