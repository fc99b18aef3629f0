//! Completeness of entities (shops, items) over the period axis
//!
//! An entity is complete when it has at least one record in every distinct
//! period observed in the dataset. Only complete shops are eligible for
//! seasonal forecasting.

use crate::error::{ForecastError, Result};
use crate::periods::Period;
use std::collections::{BTreeMap, BTreeSet};

/// Coverage fraction per entity.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessTable<E: Ord> {
    total_periods: usize,
    coverage: BTreeMap<E, usize>,
}

impl<E: Ord + Clone> CompletenessTable<E> {
    /// Number of distinct periods in the dataset.
    pub fn total_periods(&self) -> usize {
        self.total_periods
    }

    /// Number of entities with at least one record.
    pub fn len(&self) -> usize {
        self.coverage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coverage.is_empty()
    }

    /// Coverage fraction of one entity, `None` if it never occurs.
    pub fn fraction(&self, entity: &E) -> Option<f64> {
        self.coverage
            .get(entity)
            .map(|&count| count as f64 / self.total_periods as f64)
    }

    /// `(entity, fraction)` rows.
    pub fn fractions(&self) -> impl Iterator<Item = (&E, f64)> + '_ {
        let total = self.total_periods as f64;
        self.coverage
            .iter()
            .map(move |(entity, &count)| (entity, count as f64 / total))
    }

    /// Entities present in every period.
    pub fn complete_entities(&self) -> Vec<E> {
        self.coverage
            .iter()
            .filter(|(_, count)| **count == self.total_periods)
            .map(|(entity, _)| entity.clone())
            .collect()
    }

    /// Entities missing from at least one period.
    pub fn incomplete_entities(&self) -> Vec<E> {
        self.coverage
            .iter()
            .filter(|(_, count)| **count < self.total_periods)
            .map(|(entity, _)| entity.clone())
            .collect()
    }

    pub fn is_complete(&self, entity: &E) -> bool {
        self.coverage.get(entity) == Some(&self.total_periods)
    }
}

/// Compute coverage for every entity appearing in `pairs`.
///
/// Duplicate `(period, entity)` pairs count once. Fails with
/// `DivisionByZero` when there are no periods at all.
pub fn completeness<E, I>(pairs: I) -> Result<CompletenessTable<E>>
where
    E: Ord + Clone,
    I: IntoIterator<Item = (Period, E)>,
{
    let distinct: BTreeSet<(Period, E)> = pairs.into_iter().collect();
    let periods: BTreeSet<Period> = distinct.iter().map(|(p, _)| *p).collect();

    if periods.is_empty() {
        return Err(ForecastError::DivisionByZero(
            "completeness over a dataset with no periods".to_string(),
        ));
    }

    let mut coverage: BTreeMap<E, usize> = BTreeMap::new();
    for (_, entity) in distinct {
        *coverage.entry(entity).or_insert(0) += 1;
    }

    Ok(CompletenessTable {
        total_periods: periods.len(),
        coverage,
    })
}
