//! Calendar-month periods and rolling forecast horizons

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Last year a four-digit label can hold
const LAST_YEAR: i32 = 9999;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Create a period, validating the month.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(0..=LAST_YEAR).contains(&year) {
            return Err(ForecastError::InvalidPeriodFormat(format!(
                "{:04}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    /// Period containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the period.
    pub fn first_day(&self) -> NaiveDate {
        // year and month are validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The following calendar month, rolling December into January.
    ///
    /// Fails with `InvalidParameter` after `9999-12`, the last month a
    /// `YYYY-MM` label can name.
    pub fn succ(&self) -> Result<Self> {
        if self.year == LAST_YEAR && self.month == 12 {
            return Err(ForecastError::InvalidParameter(format!(
                "No period after {}: labels end at {}-12",
                self, LAST_YEAR
            )));
        }
        let next = self
            .first_day()
            .checked_add_months(Months::new(1))
            .ok_or_else(|| ForecastError::InvalidPeriodFormat(self.to_string()))?;
        Period::new(next.year(), next.month())
    }

    /// The preceding calendar month.
    pub fn pred(&self) -> Result<Self> {
        let previous = self
            .first_day()
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| ForecastError::InvalidPeriodFormat(self.to_string()))?;
        Period::new(previous.year(), previous.month())
    }

    /// The `n` periods following this one.
    pub fn next_n(&self, n: usize) -> Result<Vec<Period>> {
        if n == 0 {
            return Err(ForecastError::InvalidParameter(
                "Number of periods must be at least 1".to_string(),
            ));
        }

        let mut periods = Vec::with_capacity(n);
        let mut current = *self;
        for _ in 0..n {
            current = current.succ()?;
            periods.push(current);
        }
        Ok(periods)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ForecastError::InvalidPeriodFormat(s.to_string());

        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || b.is_ascii_digit());
        if !shape_ok {
            return Err(invalid());
        }

        let date = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map_err(|_| invalid())?;
        Ok(Period::from_date(date))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Labels of the `n` months following `start` (`YYYY-MM`).
///
/// Labels stop at `9999-12`; a horizon reaching past it fails with
/// `InvalidParameter`.
pub fn next_n_periods(start: &str, n: usize) -> Result<Vec<String>> {
    let start: Period = start.parse()?;
    Ok(start
        .next_n(n)?
        .into_iter()
        .map(|p| p.to_string())
        .collect())
}

/// Check that `periods` is strictly increasing with no missing month.
pub fn ensure_contiguous(periods: &[Period]) -> Result<()> {
    for pair in periods.windows(2) {
        let expected = pair[0].succ()?;
        if pair[1] != expected {
            return Err(ForecastError::DataError(format!(
                "Period axis is not contiguous: {} is followed by {}, expected {}",
                pair[0], pair[1], expected
            )));
        }
    }
    Ok(())
}
