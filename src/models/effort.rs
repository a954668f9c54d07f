//! Effort vector model.
//!
//! An effort vector measures workload along several named dimensions. Each
//! dimension is either a bare scalar (e.g. `cognitive_density`) or a group of
//! named sub-features (e.g. `physical_load → {total_weight, heavy_pkg_ratio,
//! bulky_ratio}`). Cluster vectors describe one unit of work; driver vectors
//! accumulate everything a driver has been assigned, less decay.
//!
//! # Schema
//!
//! Vectors combined in one run must share the same schema: the same
//! dimensions, and for each dimension the same shape and sub-feature names.
//! Arithmetic across different schemas is rejected with
//! [`AllocError::SchemaMismatch`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AllocError, Result};

/// Canonical dimension names produced by the feature extractor.
pub mod dimension {
    /// Package weight and bulk.
    pub const PHYSICAL_LOAD: &str = "physical_load";
    /// Floors climbed and elevator coverage.
    pub const STAIR_LOAD: &str = "stair_load";
    /// Traffic, parking and stop density.
    pub const TRAFFIC_STRESS: &str = "traffic_stress";
    /// Route distance and duration.
    pub const ROUTE_DISTANCE: &str = "route_distance";
    /// Packages per stop weighted by stop density.
    pub const COGNITIVE_DENSITY: &str = "cognitive_density";

    /// All five dimensions in their canonical order.
    pub const ALL: [&str; 5] = [
        PHYSICAL_LOAD,
        STAIR_LOAD,
        TRAFFIC_STRESS,
        ROUTE_DISTANCE,
        COGNITIVE_DENSITY,
    ];
}

/// Value of one dimension: a scalar or a group of sub-feature scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionValue {
    /// Single scalar measure.
    Scalar(f64),
    /// Named sub-features.
    Composite(BTreeMap<String, f64>),
}

impl DimensionValue {
    /// Sum of all leaf values in this dimension.
    pub fn sum(&self) -> f64 {
        match self {
            DimensionValue::Scalar(v) => *v,
            DimensionValue::Composite(features) => features.values().sum(),
        }
    }

    /// Number of leaf values.
    pub fn leaf_count(&self) -> usize {
        match self {
            DimensionValue::Scalar(_) => 1,
            DimensionValue::Composite(features) => features.len(),
        }
    }

    /// Multiplies every leaf by `factor`.
    pub fn scale(&mut self, factor: f64) {
        match self {
            DimensionValue::Scalar(v) => *v *= factor,
            DimensionValue::Composite(features) => {
                for v in features.values_mut() {
                    *v *= factor;
                }
            }
        }
    }

    /// Whether two values share shape and sub-feature names.
    pub fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (DimensionValue::Scalar(_), DimensionValue::Scalar(_)) => true,
            (DimensionValue::Composite(a), DimensionValue::Composite(b)) => {
                a.len() == b.len() && a.keys().zip(b.keys()).all(|(x, y)| x == y)
            }
            _ => false,
        }
    }

    fn zeroed(&self) -> Self {
        match self {
            DimensionValue::Scalar(_) => DimensionValue::Scalar(0.0),
            DimensionValue::Composite(features) => DimensionValue::Composite(
                features.keys().map(|k| (k.clone(), 0.0)).collect(),
            ),
        }
    }
}

/// Address of a single leaf: a dimension plus an optional sub-feature.
///
/// Scalar dimensions use `feature = None`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureKey {
    /// Dimension name.
    pub dimension: String,
    /// Sub-feature name (`None` for scalar dimensions).
    #[serde(default)]
    pub feature: Option<String>,
}

impl FeatureKey {
    /// Key for a sub-feature of a composite dimension.
    pub fn new(dimension: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            feature: Some(feature.into()),
        }
    }

    /// Key for a scalar dimension.
    pub fn scalar(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            feature: None,
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.feature {
            Some(feature) => write!(f, "{}.{}", self.dimension, feature),
            None => write!(f, "{}", self.dimension),
        }
    }
}

/// A multi-dimensional workload measure.
///
/// # Example
/// ```
/// use fair_dispatch::models::EffortVector;
///
/// let a = EffortVector::new()
///     .with_feature("physical_load", "total_weight", 40.0)
///     .with_scalar("cognitive_density", 2.0);
/// let b = a.clone();
///
/// let sum = a.add(&b).unwrap();
/// assert_eq!(sum.magnitude(), a.magnitude() + b.magnitude());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffortVector {
    dimensions: BTreeMap<String, DimensionValue>,
}

impl EffortVector {
    /// Creates an empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a scalar dimension.
    pub fn with_scalar(mut self, dimension: impl Into<String>, value: f64) -> Self {
        self.dimensions
            .insert(dimension.into(), DimensionValue::Scalar(value));
        self
    }

    /// Sets a sub-feature of a composite dimension, creating it if absent.
    ///
    /// Calling this on a dimension already set with [`with_scalar`](Self::with_scalar)
    /// changes the vector's schema: the scalar is discarded and the dimension
    /// becomes composite. Debug builds reject that as a builder mistake.
    pub fn with_feature(
        mut self,
        dimension: impl Into<String>,
        feature: impl Into<String>,
        value: f64,
    ) -> Self {
        let dimension = dimension.into();
        debug_assert!(
            !matches!(self.dimensions.get(&dimension), Some(DimensionValue::Scalar(_))),
            "with_feature on scalar dimension '{dimension}' would change the schema"
        );
        let entry = self
            .dimensions
            .entry(dimension)
            .or_insert_with(|| DimensionValue::Composite(BTreeMap::new()));
        match entry {
            DimensionValue::Composite(features) => {
                features.insert(feature.into(), value);
            }
            DimensionValue::Scalar(_) => {
                let mut features = BTreeMap::new();
                features.insert(feature.into(), value);
                *entry = DimensionValue::Composite(features);
            }
        }
        self
    }

    /// Returns a vector with the same schema and every leaf set to zero.
    pub fn zeroed(&self) -> Self {
        Self {
            dimensions: self
                .dimensions
                .iter()
                .map(|(name, value)| (name.clone(), value.zeroed()))
                .collect(),
        }
    }

    /// Value of a dimension.
    pub fn get(&self, dimension: &str) -> Option<&DimensionValue> {
        self.dimensions.get(dimension)
    }

    /// Value of a single leaf.
    ///
    /// Returns `None` if the dimension is missing, or if the key's shape
    /// (scalar vs sub-feature) does not match the dimension.
    pub fn leaf(&self, key: &FeatureKey) -> Option<f64> {
        match (self.dimensions.get(&key.dimension)?, key.feature.as_deref()) {
            (DimensionValue::Scalar(v), None) => Some(*v),
            (DimensionValue::Composite(features), Some(name)) => features.get(name).copied(),
            _ => None,
        }
    }

    /// Iterates over dimensions in name order.
    pub fn dimensions(&self) -> impl Iterator<Item = (&str, &DimensionValue)> + '_ {
        self.dimensions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over every leaf as `(dimension, sub-feature, value)`.
    pub fn leaves(&self) -> impl Iterator<Item = (&str, Option<&str>, f64)> + '_ {
        self.dimensions.iter().flat_map(|(dim, value)| {
            let (scalar, features) = match value {
                DimensionValue::Scalar(v) => (Some(*v), None),
                DimensionValue::Composite(features) => (None, Some(features)),
            };
            scalar
                .into_iter()
                .map(move |v| (dim.as_str(), None, v))
                .chain(
                    features
                        .into_iter()
                        .flat_map(|features| features.iter())
                        .map(move |(f, v)| (dim.as_str(), Some(f.as_str()), *v)),
                )
        })
    }

    /// Number of dimensions.
    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Whether the vector has no dimensions.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Sum of every leaf value.
    ///
    /// Mixes units, so it only serves as a relative difficulty ranking.
    pub fn magnitude(&self) -> f64 {
        self.dimensions.values().map(DimensionValue::sum).sum()
    }

    /// Whether every leaf is a finite number.
    pub fn is_finite(&self) -> bool {
        self.leaves().all(|(_, _, v)| v.is_finite())
    }

    /// Checks that `other` has exactly this vector's schema.
    pub fn check_schema(&self, other: &Self) -> Result<()> {
        for (name, value) in &self.dimensions {
            match other.dimensions.get(name) {
                None => {
                    return Err(AllocError::SchemaMismatch(format!(
                        "dimension '{name}' missing from other vector"
                    )))
                }
                Some(theirs) if !value.same_shape(theirs) => {
                    return Err(AllocError::SchemaMismatch(format!(
                        "dimension '{name}' has a different shape or sub-features"
                    )))
                }
                Some(_) => {}
            }
        }
        if let Some(extra) = other
            .dimensions
            .keys()
            .find(|name| !self.dimensions.contains_key(*name))
        {
            return Err(AllocError::SchemaMismatch(format!(
                "unexpected dimension '{extra}'"
            )));
        }
        Ok(())
    }

    /// Whether `other` has exactly this vector's schema.
    pub fn same_schema(&self, other: &Self) -> bool {
        self.check_schema(other).is_ok()
    }

    /// Returns `self + other`, leafwise. Neither input is modified.
    ///
    /// # Errors
    /// [`AllocError::SchemaMismatch`] if the schemas differ.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_schema(other)?;
        let mut result = self.clone();
        for (name, value) in result.dimensions.iter_mut() {
            match (value, &other.dimensions[name]) {
                (DimensionValue::Scalar(a), DimensionValue::Scalar(b)) => *a += b,
                (DimensionValue::Composite(a), DimensionValue::Composite(b)) => {
                    for (feature, v) in a.iter_mut() {
                        *v += b[feature];
                    }
                }
                _ => unreachable!("shapes checked by check_schema"),
            }
        }
        Ok(result)
    }

    /// Multiplies each dimension by the factor `factor_for(dimension)`.
    pub fn scale_by(&mut self, factor_for: impl Fn(&str) -> f64) {
        for (name, value) in self.dimensions.iter_mut() {
            value.scale(factor_for(name));
        }
    }
}
