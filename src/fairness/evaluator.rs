//! Workload variance and the fairness penalty.
//!
//! # Objective
//!
//! For each measured dimension `d`, let `m_i(d)` be driver `i`'s normalized
//! magnitude (see [`Bounds::normalized_magnitude`]). The dimension's spread
//! is the population variance
//!
//! ```text
//! Var(d) = (1/n) Σ (m_i(d) - mean(d))²
//! ```
//!
//! and the penalty is `Σ w_d · Var(d)`. Lower is fairer.
//!
//! # Hypothetical evaluation
//!
//! The allocator scores every candidate driver for every cluster. Instead of
//! copying the driver population per candidate, [`MagnitudeTable`] keeps a
//! read-only snapshot of per-driver magnitudes and evaluates a candidate by
//! substituting only that driver's row.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Bounds;
use crate::error::Result;
use crate::models::{dimension, DriverState, EffortVector};

/// Variance per measured dimension.
pub type VarianceByDimension = BTreeMap<String, f64>;

/// Population variance (divisor `n`, not `n - 1`). Zero for an empty set.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n
}

/// Relative tolerance under which two penalties count as equal.
pub const PENALTY_TIE_TOLERANCE: f64 = 1e-9;

/// Whether two penalties are equal up to floating-point noise.
///
/// Candidates that are mathematically tied can differ in the last bits
/// depending on which driver's row was substituted; those must fall through
/// to the tie-break instead of being decided by rounding.
pub fn penalties_tied(a: f64, b: f64) -> bool {
    (a - b).abs() <= PENALTY_TIE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn canonical_rank(dim: &str) -> usize {
    dimension::ALL
        .iter()
        .position(|c| *c == dim)
        .unwrap_or(dimension::ALL.len())
}

/// Penalty weight per measured dimension.
///
/// The listed dimensions are exactly the ones the evaluator measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FairnessWeights {
    weights: BTreeMap<String, f64>,
}

impl Default for FairnessWeights {
    fn default() -> Self {
        Self::new()
            .with_weight(dimension::PHYSICAL_LOAD, 1.5)
            .with_weight(dimension::STAIR_LOAD, 1.3)
            .with_weight(dimension::TRAFFIC_STRESS, 1.0)
            .with_weight(dimension::ROUTE_DISTANCE, 1.0)
            .with_weight(dimension::COGNITIVE_DENSITY, 0.8)
    }
}

impl FairnessWeights {
    /// Creates an empty weight set.
    pub fn new() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }

    /// Sets the weight of a dimension.
    pub fn with_weight(mut self, dimension: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(dimension.into(), weight);
        self
    }

    /// Weight of a dimension (0.0 if not measured).
    pub fn weight(&self, dimension: &str) -> f64 {
        self.weights.get(dimension).copied().unwrap_or(0.0)
    }

    /// Measured dimensions in canonical order ([`dimension::ALL`] first,
    /// then any others by name).
    ///
    /// Penalties are always summed in this order.
    pub fn dimensions(&self) -> impl Iterator<Item = &str> + '_ {
        let mut dims: Vec<&str> = self.weights.keys().map(String::as_str).collect();
        dims.sort_by_key(|d| canonical_rank(d));
        dims.into_iter()
    }

    /// `(dimension, weight)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.dimensions().map(move |d| (d, self.weight(d)))
    }

    /// Number of measured dimensions.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether no dimension is measured.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Computes workload variance and the weighted fairness penalty.
#[derive(Debug, Clone, Default)]
pub struct FairnessEvaluator {
    weights: FairnessWeights,
}

impl FairnessEvaluator {
    /// Creates an evaluator with the given weights.
    pub fn new(weights: FairnessWeights) -> Self {
        Self { weights }
    }

    /// The evaluator's weights.
    pub fn weights(&self) -> &FairnessWeights {
        &self.weights
    }

    /// Per-dimension population variance of normalized magnitude across
    /// drivers. Every measured dimension gets an entry (0.0 with no drivers).
    pub fn variance(&self, drivers: &[DriverState], bounds: &Bounds) -> Result<VarianceByDimension> {
        Ok(MagnitudeTable::build(self, drivers, bounds)?.variances())
    }

    /// Weighted sum of per-dimension variances, in canonical dimension order.
    ///
    /// Dimensions without a weight contribute nothing.
    pub fn penalty(&self, variance: &VarianceByDimension) -> f64 {
        self.weights
            .iter()
            .map(|(d, w)| w * variance.get(d).copied().unwrap_or(0.0))
            .sum()
    }

    /// Normalized magnitude of every measured dimension of one vector,
    /// in the evaluator's dimension order.
    pub fn magnitudes(&self, vector: &EffortVector, bounds: &Bounds) -> Result<Vec<f64>> {
        self.weights
            .dimensions()
            .map(|d| bounds.normalized_magnitude(vector, d))
            .collect()
    }
}

/// Snapshot of normalized magnitudes, one row per driver.
///
/// Read-only during candidate evaluation; a row is replaced only when an
/// assignment is committed.
#[derive(Debug, Clone)]
pub struct MagnitudeTable {
    dimensions: Vec<String>,
    weights: Vec<f64>,
    /// `columns[d][i]`: magnitude of dimension `d` for driver `i`.
    columns: Vec<Vec<f64>>,
}

impl MagnitudeTable {
    /// Builds the table for a driver population.
    pub fn build(
        evaluator: &FairnessEvaluator,
        drivers: &[DriverState],
        bounds: &Bounds,
    ) -> Result<Self> {
        let dimensions: Vec<String> = evaluator.weights.dimensions().map(str::to_string).collect();
        let weights = dimensions
            .iter()
            .map(|d| evaluator.weights.weight(d))
            .collect();
        let mut columns = vec![Vec::with_capacity(drivers.len()); dimensions.len()];

        for driver in drivers {
            let row = evaluator.magnitudes(&driver.cumulative_effort_vector, bounds)?;
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }

        Ok(Self {
            dimensions,
            weights,
            columns,
        })
    }

    /// Number of drivers.
    pub fn driver_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Current per-dimension variance.
    pub fn variances(&self) -> VarianceByDimension {
        self.dimensions
            .iter()
            .zip(&self.columns)
            .map(|(d, column)| (d.clone(), population_variance(column)))
            .collect()
    }

    /// Current penalty.
    pub fn penalty(&self) -> f64 {
        self.columns
            .iter()
            .zip(&self.weights)
            .map(|(column, w)| w * population_variance(column))
            .sum()
    }

    /// Penalty if driver `index` had magnitudes `row` instead of its own.
    ///
    /// Evaluated against the unmodified snapshot; the table is not changed.
    pub fn penalty_with(&self, index: usize, row: &[f64]) -> f64 {
        self.columns
            .iter()
            .zip(&self.weights)
            .zip(row)
            .map(|((column, w), &candidate)| {
                w * substituted_variance(column, index, candidate)
            })
            .sum()
    }

    /// Replaces driver `index`'s row after a commit.
    pub fn replace(&mut self, index: usize, row: Vec<f64>) {
        for (column, value) in self.columns.iter_mut().zip(row) {
            column[index] = value;
        }
    }
}

/// Population variance of `column` with element `index` replaced by
/// `candidate`. Same summation order as [`population_variance`].
fn substituted_variance(column: &[f64], index: usize, candidate: f64) -> f64 {
    if column.is_empty() {
        return 0.0;
    }
    let value_at = |i: usize| if i == index { candidate } else { column[i] };
    let n = column.len() as f64;
    let mean = (0..column.len()).map(value_at).sum::<f64>() / n;
    (0..column.len())
        .map(|i| {
            let x = value_at(i);
            (x - mean) * (x - mean)
        })
        .sum::<f64>()
        / n
}
