//! Bounded Nelder-Mead simplex optimization
//!
//! Used to estimate smoothing coefficients. Every candidate point is clamped
//! into its box before evaluation, so the objective never sees an
//! out-of-range coefficient. An optional deadline stops the search early;
//! the caller decides what an unfinished search means.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

use crate::{MathError, Result};

/// Inclusive lower/upper bound for one dimension.
pub type Bounds = (f64, f64);

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on both objective spread and simplex size.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Initial simplex edge, as a fraction of each bound's width.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the simplex converged within tolerance.
    pub converged: bool,
    /// Whether the deadline interrupted the search.
    pub timed_out: bool,
}

/// Minimize `objective` inside the box given by `bounds`.
///
/// Non-finite objective values are treated as `f64::MAX`.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: &[Bounds],
    config: &NelderMeadConfig,
    deadline: Option<Instant>,
) -> Result<NelderMeadResult>
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::InvalidInput(
            "Cannot optimize over zero dimensions".to_string(),
        ));
    }
    if bounds.len() != n {
        return Err(MathError::InvalidInput(format!(
            "Expected {} bounds, got {}",
            n,
            bounds.len()
        )));
    }
    if bounds.iter().any(|&(lo, hi)| !(lo <= hi)) {
        return Err(MathError::InvalidInput(
            "Lower bound must not exceed upper bound".to_string(),
        ));
    }

    let eval = |point: &[f64]| {
        let value = objective(point);
        if value.is_finite() {
            value
        } else {
            f64::MAX
        }
    };

    let start = clamp(initial, bounds);
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for i in 0..n {
        let (lo, hi) = bounds[i];
        let step = ((hi - lo) * config.initial_step).max(f64::EPSILON);
        let mut vertex = start.clone();
        vertex[i] = if vertex[i] + step <= hi {
            vertex[i] + step
        } else {
            (vertex[i] - step).max(lo)
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;
    let mut timed_out = false;

    while iterations < config.max_iter {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            timed_out = true;
            break;
        }
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        let centroid = centroid_without(&simplex, worst);
        let spread = values[worst] - values[best];
        let size = simplex
            .iter()
            .map(|v| max_abs_diff(v, &simplex[best]))
            .fold(0.0, f64::max);
        if spread.abs() < config.tolerance && size < config.tolerance.sqrt() {
            converged = true;
            break;
        }

        let reflected = clamp(&towards(&centroid, &simplex[worst], -config.alpha), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < values[best] {
            let expanded = clamp(&towards(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        // Outside contraction when the reflection beat the worst vertex,
        // inside contraction otherwise.
        let (anchor, anchor_value) = if reflected_value < values[worst] {
            (reflected, reflected_value)
        } else {
            (simplex[worst].clone(), values[worst])
        };
        let contracted = clamp(&towards(&centroid, &anchor, config.rho), bounds);
        let contracted_value = eval(&contracted);
        if contracted_value < anchor_value {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        let best_point = simplex[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            let shrunk = towards(&best_point, &simplex[i], config.sigma);
            simplex[i] = clamp(&shrunk, bounds);
            values[i] = eval(&simplex[i]);
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    Ok(NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
        timed_out,
    })
}

/// `origin + factor * (point - origin)`
fn towards(origin: &[f64], point: &[f64], factor: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point.iter())
        .map(|(o, p)| o + factor * (p - o))
        .collect()
}

fn centroid_without(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let dim = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; dim];
    for (i, vertex) in simplex.iter().enumerate() {
        if i == exclude {
            continue;
        }
        for (c, v) in centroid.iter_mut().zip(vertex.iter()) {
            *c += v;
        }
    }
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

fn clamp(point: &[f64], bounds: &[Bounds]) -> Vec<f64> {
    point
        .iter()
        .zip(bounds.iter())
        .map(|(&x, &(lo, hi))| x.clamp(lo, hi))
        .collect()
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}
