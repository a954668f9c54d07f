//! Feature bounds and min-max normalization.
//!
//! Effort features live in unrelated units (kilograms, seconds, ratios).
//! Bounds observed over the cluster population map each feature onto a
//! comparable scale before variances are taken.
//!
//! Bounds are estimated from cluster vectors only, never from driver state,
//! and stay frozen for the whole run. Driver accumulations can therefore
//! normalize outside [0, 1]; that is expected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AllocError, Result};
use crate::models::{Cluster, DimensionValue, EffortVector, FeatureKey};

/// Min-max normalization.
///
/// Returns exactly `0.0` when `min == max`: a feature with no spread
/// contributes nothing to variance.
#[inline]
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.0;
    }
    (value - min) / (max - min)
}

/// Observed range of one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    /// Smallest observed value.
    pub min: f64,
    /// Largest observed value.
    pub max: f64,
}

impl FeatureRange {
    fn single(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    fn observe(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Normalizes a value against this range.
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        normalize(value, self.min, self.max)
    }

    /// Whether the range has no spread.
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct DimensionBounds {
    scalar: Option<FeatureRange>,
    features: BTreeMap<String, FeatureRange>,
}

/// Per-feature (min, max) ranges for one run.
///
/// # Example
/// ```
/// use fair_dispatch::fairness::Bounds;
/// use fair_dispatch::models::{EffortVector, FeatureKey};
///
/// let a = EffortVector::new().with_scalar("cognitive_density", 2.0);
/// let b = EffortVector::new().with_scalar("cognitive_density", 6.0);
/// let bounds = Bounds::from_vectors([&a, &b]);
///
/// let range = bounds.range(&FeatureKey::scalar("cognitive_density")).unwrap();
/// assert_eq!((range.min, range.max), (2.0, 6.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    dimensions: BTreeMap<String, DimensionBounds>,
}

impl Bounds {
    /// Estimates bounds from the cluster population.
    pub fn from_clusters(clusters: &[Cluster]) -> Self {
        Self::from_vectors(clusters.iter().map(|c| &c.effort))
    }

    /// Estimates bounds from any set of vectors.
    pub fn from_vectors<'a>(vectors: impl IntoIterator<Item = &'a EffortVector>) -> Self {
        let mut bounds = Self::default();
        for vector in vectors {
            for (dim, feature, value) in vector.leaves() {
                let entry = bounds.dimensions.entry(dim.to_string()).or_default();
                match feature {
                    None => match &mut entry.scalar {
                        Some(range) => range.observe(value),
                        None => entry.scalar = Some(FeatureRange::single(value)),
                    },
                    Some(name) => match entry.features.get_mut(name) {
                        Some(range) => range.observe(value),
                        None => {
                            entry
                                .features
                                .insert(name.to_string(), FeatureRange::single(value));
                        }
                    },
                }
            }
        }
        bounds
    }

    /// Range of a feature, if it was observed.
    pub fn range(&self, key: &FeatureKey) -> Option<FeatureRange> {
        self.lookup(&key.dimension, key.feature.as_deref())
    }

    fn lookup(&self, dimension: &str, feature: Option<&str>) -> Option<FeatureRange> {
        let dim = self.dimensions.get(dimension)?;
        match feature {
            None => dim.scalar,
            Some(name) => dim.features.get(name).copied(),
        }
    }

    fn require(&self, dimension: &str, feature: Option<&str>) -> Result<FeatureRange> {
        self.lookup(dimension, feature).ok_or_else(|| {
            AllocError::UnknownFeature(FeatureKey {
                dimension: dimension.to_string(),
                feature: feature.map(str::to_string),
            })
        })
    }

    /// Number of recorded features.
    pub fn feature_count(&self) -> usize {
        self.dimensions
            .values()
            .map(|d| d.features.len() + usize::from(d.scalar.is_some()))
            .sum()
    }

    /// Whether no features were recorded.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Normalized magnitude of one dimension of `vector`.
    ///
    /// For a composite dimension this is the sum (not the mean) of the
    /// normalized sub-features, so dimensions with more sub-features weigh
    /// more. For a scalar dimension it is the single normalized value.
    ///
    /// # Errors
    /// - [`AllocError::MissingDimension`] if `vector` lacks the dimension.
    /// - [`AllocError::UnknownFeature`] if a leaf was never observed.
    pub fn normalized_magnitude(&self, vector: &EffortVector, dimension: &str) -> Result<f64> {
        match vector.get(dimension) {
            None => Err(AllocError::MissingDimension(dimension.to_string())),
            Some(DimensionValue::Scalar(value)) => {
                Ok(self.require(dimension, None)?.normalize(*value))
            }
            Some(DimensionValue::Composite(features)) => {
                let mut total = 0.0;
                for (name, value) in features {
                    total += self.require(dimension, Some(name))?.normalize(*value);
                }
                Ok(total)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(weight: f64, ratio: f64, density: f64) -> EffortVector {
        EffortVector::new()
            .with_feature("physical_load", "total_weight", weight)
            .with_feature("physical_load", "heavy_pkg_ratio", ratio)
            .with_scalar("cognitive_density", density)
    }

    #[test]
    fn test_normalize_degenerate() {
        assert_eq!(normalize(5.0, 3.0, 3.0), 0.0);
        assert_eq!(normalize(-100.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_normalize_endpoints() {
        assert_eq!(normalize(2.0, 2.0, 10.0), 0.0);
        assert_eq!(normalize(10.0, 2.0, 10.0), 1.0);
        assert!((normalize(6.0, 2.0, 10.0) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_bounds_from_vectors() {
        let a = vector(10.0, 0.2, 1.0);
        let b = vector(30.0, 0.1, 4.0);
        let c = vector(20.0, 0.5, 2.0);
        let bounds = Bounds::from_vectors([&a, &b, &c]);

        let w = bounds
            .range(&FeatureKey::new("physical_load", "total_weight"))
            .unwrap();
        assert_eq!((w.min, w.max), (10.0, 30.0));

        let r = bounds
            .range(&FeatureKey::new("physical_load", "heavy_pkg_ratio"))
            .unwrap();
        assert_eq!((r.min, r.max), (0.1, 0.5));

        let d = bounds.range(&FeatureKey::scalar("cognitive_density")).unwrap();
        assert_eq!((d.min, d.max), (1.0, 4.0));

        assert_eq!(bounds.feature_count(), 3);
    }

    #[test]
    fn test_every_observed_key_has_bounds() {
        let a = vector(10.0, 0.2, 1.0);
        let bounds = Bounds::from_vectors([&a]);
        for (dim, feature, _) in a.leaves() {
            let key = FeatureKey {
                dimension: dim.to_string(),
                feature: feature.map(str::to_string),
            };
            assert!(bounds.range(&key).unwrap().is_degenerate());
        }
    }

    #[test]
    fn test_normalized_magnitude_sums_subfeatures() {
        let a = vector(10.0, 0.0, 1.0);
        let b = vector(30.0, 1.0, 3.0);
        let bounds = Bounds::from_vectors([&a, &b]);

        let sample = vector(20.0, 0.5, 2.0);
        // 0.5 + 0.5 (sum, not average)
        let physical = bounds.normalized_magnitude(&sample, "physical_load").unwrap();
        assert!((physical - 1.0).abs() < 1e-10);

        let cognitive = bounds
            .normalized_magnitude(&sample, "cognitive_density")
            .unwrap();
        assert!((cognitive - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_normalized_magnitude_outside_range() {
        let a = vector(10.0, 0.0, 1.0);
        let b = vector(30.0, 1.0, 3.0);
        let bounds = Bounds::from_vectors([&a, &b]);

        // Zeroed driver state falls below the cluster minimum
        let zero = a.zeroed();
        let physical = bounds.normalized_magnitude(&zero, "physical_load").unwrap();
        assert!((physical - (-0.5)).abs() < 1e-10);
    }

    #[test]
    fn test_normalized_magnitude_errors() {
        let a = vector(10.0, 0.0, 1.0);
        let bounds = Bounds::from_vectors([&a]);

        let missing = EffortVector::new().with_scalar("cognitive_density", 1.0);
        assert!(matches!(
            bounds.normalized_magnitude(&missing, "physical_load"),
            Err(AllocError::MissingDimension(_))
        ));

        let unknown = EffortVector::new().with_feature("physical_load", "bulky_ratio", 1.0);
        assert!(matches!(
            bounds.normalized_magnitude(&unknown, "physical_load"),
            Err(AllocError::UnknownFeature(_))
        ));
    }

    #[test]
    fn test_empty_bounds() {
        let bounds = Bounds::from_clusters(&[]);
        assert!(bounds.is_empty());
        assert_eq!(bounds.feature_count(), 0);
    }
}
