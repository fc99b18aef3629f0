//! Rounding policy for unit-sales output
//!
//! Forecasts stay fractional inside the models. Conversion to whole units
//! happens once, at the point of output, using round-half-up.

/// Round half up: `2.5 -> 3`, `-2.5 -> -2`.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Convert a forecast value into whole, non-negative units.
///
/// Negative and non-finite values map to zero.
pub fn round_units(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    round_half_up(value) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_values_round_up() {
        assert_eq!(round_half_up(0.5), 1.0);
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(2.4999), 2.0);
        assert_eq!(round_half_up(-2.5), -2.0);
    }

    #[test]
    fn test_units_are_non_negative() {
        assert_eq!(round_units(-3.7), 0);
        assert_eq!(round_units(f64::NAN), 0);
        assert_eq!(round_units(f64::INFINITY), 0);
        assert_eq!(round_units(69.5), 70);
        assert_eq!(round_units(29.49), 29);
    }
}
