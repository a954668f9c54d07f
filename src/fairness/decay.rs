//! Per-dimension workload decay.
//!
//! Models one elapsed period of recovery: every leaf of a driver's
//! cumulative vector is multiplied by its dimension's factor. Physical
//! strain fades fastest, traffic stress slowest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{dimension, EffortVector};

/// Decay factors by dimension, with a fallback for unlisted dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayProfile {
    /// Factor per dimension.
    pub factors: BTreeMap<String, f64>,
    /// Factor for dimensions not listed in `factors`.
    pub default_factor: f64,
}

impl Default for DecayProfile {
    fn default() -> Self {
        let factors = [
            (dimension::PHYSICAL_LOAD, 0.85),
            (dimension::STAIR_LOAD, 0.85),
            (dimension::TRAFFIC_STRESS, 0.95),
            (dimension::ROUTE_DISTANCE, 0.92),
            (dimension::COGNITIVE_DENSITY, 0.90),
        ]
        .into_iter()
        .map(|(d, f)| (d.to_string(), f))
        .collect();

        Self {
            factors,
            default_factor: 0.9,
        }
    }
}

impl DecayProfile {
    /// A profile with no listed dimensions, decaying everything by `factor`.
    pub fn uniform(factor: f64) -> Self {
        Self {
            factors: BTreeMap::new(),
            default_factor: factor,
        }
    }

    /// Sets the factor for one dimension.
    pub fn with_factor(mut self, dimension: impl Into<String>, factor: f64) -> Self {
        self.factors.insert(dimension.into(), factor);
        self
    }

    /// Factor applied to `dimension`.
    pub fn factor(&self, dimension: &str) -> f64 {
        self.factors
            .get(dimension)
            .copied()
            .unwrap_or(self.default_factor)
    }

    /// Decays a vector in place.
    pub fn apply(&self, vector: &mut EffortVector) {
        vector.scale_by(|dim| self.factor(dim));
    }

    /// Every factor, including the default.
    pub(crate) fn all_factors(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.factors
            .iter()
            .map(|(d, f)| (d.as_str(), *f))
            .chain(std::iter::once(("<default>", self.default_factor)))
    }
}
