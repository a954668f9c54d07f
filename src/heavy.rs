//! Heavy-route classification and the consecutive heavy-day limit.
//!
//! Two thresholds are taken from the cluster population at a fixed
//! percentile: one on physical load, one on route duration. A cluster at or
//! above either threshold is heavy. Drivers who have already worked the
//! maximum number of consecutive heavy days are excluded from heavy
//! clusters.
//!
//! # Percentile
//! The threshold is the element at index `floor(p · N)` of the ascending
//! sorted values, with `p = 0.75` by default (no interpolation).

use serde::{Deserialize, Serialize};

use crate::error::{AllocError, Result};
use crate::models::{dimension, Cluster, DriverState, EffortVector, FeatureKey};

/// Heavy-route classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeavyRouteConfig {
    /// Percentile in [0, 1) at which thresholds are taken.
    pub percentile: f64,
    /// A driver at this many consecutive heavy days is excluded from heavy
    /// clusters.
    pub max_consecutive_heavy_days: u32,
    /// Physical load feature.
    pub physical_feature: FeatureKey,
    /// Route duration feature.
    pub duration_feature: FeatureKey,
}

impl Default for HeavyRouteConfig {
    fn default() -> Self {
        Self {
            percentile: 0.75,
            max_consecutive_heavy_days: 2,
            physical_feature: FeatureKey::new(dimension::PHYSICAL_LOAD, "total_weight"),
            duration_feature: FeatureKey::new(dimension::ROUTE_DISTANCE, "total_duration"),
        }
    }
}

/// Thresholds derived once per run from the cluster population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeavyThresholds {
    /// Physical load threshold.
    pub physical: f64,
    /// Route duration threshold.
    pub duration: f64,
}

/// Value at index `floor(percentile · N)` of the ascending-sorted values.
///
/// Returns `None` for an empty slice.
pub fn percentile_value(values: &[f64], percentile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let index = ((sorted.len() as f64 * percentile) as usize).min(sorted.len() - 1);
    Some(sorted[index])
}

/// Classifies clusters and checks driver eligibility for one run.
#[derive(Debug, Clone)]
pub struct HeavyRouteClassifier {
    config: HeavyRouteConfig,
    thresholds: Option<HeavyThresholds>,
}

impl HeavyRouteClassifier {
    /// Derives thresholds from the cluster population.
    ///
    /// With no clusters, no thresholds exist and nothing is heavy.
    ///
    /// # Errors
    /// [`AllocError::MissingFeature`] if a cluster lacks either feature.
    pub fn fit(clusters: &[Cluster], config: &HeavyRouteConfig) -> Result<Self> {
        let physical = feature_values(clusters, &config.physical_feature)?;
        let duration = feature_values(clusters, &config.duration_feature)?;

        let thresholds = match (
            percentile_value(&physical, config.percentile),
            percentile_value(&duration, config.percentile),
        ) {
            (Some(physical), Some(duration)) => Some(HeavyThresholds { physical, duration }),
            _ => None,
        };

        Ok(Self {
            config: config.clone(),
            thresholds,
        })
    }

    /// Frozen thresholds for this run.
    pub fn thresholds(&self) -> Option<HeavyThresholds> {
        self.thresholds
    }

    /// Whether a cluster vector is heavy: physical load at or above its
    /// threshold, or duration at or above its threshold.
    pub fn is_heavy(&self, effort: &EffortVector) -> Result<bool> {
        let Some(t) = self.thresholds else {
            return Ok(false);
        };
        let physical = require(effort, &self.config.physical_feature)?;
        if physical >= t.physical {
            return Ok(true);
        }
        let duration = require(effort, &self.config.duration_feature)?;
        Ok(duration >= t.duration)
    }

    /// Whether a driver may take a cluster of the given heaviness.
    #[inline]
    pub fn is_eligible(&self, driver: &DriverState, heavy: bool) -> bool {
        driver.can_take(heavy, self.config.max_consecutive_heavy_days)
    }
}

fn require(effort: &EffortVector, key: &FeatureKey) -> Result<f64> {
    effort
        .leaf(key)
        .ok_or_else(|| AllocError::MissingFeature(key.clone()))
}

fn feature_values(clusters: &[Cluster], key: &FeatureKey) -> Result<Vec<f64>> {
    clusters.iter().map(|c| require(&c.effort, key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(id: &str, weight: f64, duration: f64) -> Cluster {
        Cluster::new(
            id,
            EffortVector::new()
                .with_feature("physical_load", "total_weight", weight)
                .with_feature("route_distance", "total_duration", duration),
        )
    }

    #[test]
    fn test_percentile_index() {
        // floor(0.75 * 4) = 3 → largest
        assert_eq!(percentile_value(&[4.0, 1.0, 3.0, 2.0], 0.75), Some(4.0));
        // floor(0.75 * 5) = 3
        assert_eq!(percentile_value(&[5.0, 1.0, 4.0, 2.0, 3.0], 0.75), Some(4.0));
        // floor(0.75 * 1) = 0
        assert_eq!(percentile_value(&[7.0], 0.75), Some(7.0));
        assert_eq!(percentile_value(&[], 0.75), None);
    }

    #[test]
    fn test_thresholds() {
        let clusters = vec![
            cluster("C1", 10.0, 100.0),
            cluster("C2", 20.0, 400.0),
            cluster("C3", 30.0, 300.0),
            cluster("C4", 40.0, 200.0),
        ];
        let c = HeavyRouteClassifier::fit(&clusters, &HeavyRouteConfig::default()).unwrap();
        let t = c.thresholds().unwrap();
        assert_eq!(t.physical, 40.0);
        assert_eq!(t.duration, 400.0);
    }

    #[test]
    fn test_heavy_on_either_trigger() {
        let clusters = vec![
            cluster("C1", 10.0, 100.0),
            cluster("C2", 20.0, 400.0),
            cluster("C3", 30.0, 300.0),
            cluster("C4", 40.0, 200.0),
        ];
        let c = HeavyRouteClassifier::fit(&clusters, &HeavyRouteConfig::default()).unwrap();

        assert!(!c.is_heavy(&clusters[0].effort).unwrap());
        assert!(c.is_heavy(&clusters[1].effort).unwrap()); // duration
        assert!(!c.is_heavy(&clusters[2].effort).unwrap());
        assert!(c.is_heavy(&clusters[3].effort).unwrap()); // physical
    }

    #[test]
    fn test_single_cluster_is_heavy() {
        let clusters = vec![cluster("C1", 5.0, 5.0)];
        let c = HeavyRouteClassifier::fit(&clusters, &HeavyRouteConfig::default()).unwrap();
        assert!(c.is_heavy(&clusters[0].effort).unwrap());
    }

    #[test]
    fn test_no_clusters() {
        let c = HeavyRouteClassifier::fit(&[], &HeavyRouteConfig::default()).unwrap();
        assert!(c.thresholds().is_none());
        assert!(!c.is_heavy(&EffortVector::new()).unwrap());
    }

    #[test]
    fn test_missing_feature() {
        let clusters = vec![Cluster::new(
            "C1",
            EffortVector::new().with_feature("physical_load", "total_weight", 1.0),
        )];
        let err = HeavyRouteClassifier::fit(&clusters, &HeavyRouteConfig::default()).unwrap_err();
        assert!(matches!(err, AllocError::MissingFeature(_)));
    }

    #[test]
    fn test_eligibility() {
        let clusters = vec![cluster("C1", 5.0, 5.0)];
        let c = HeavyRouteClassifier::fit(&clusters, &HeavyRouteConfig::default()).unwrap();
        let schema = &clusters[0].effort;

        let rested = DriverState::fresh("D1", schema).with_heavy_days(1);
        let tired = DriverState::fresh("D2", schema).with_heavy_days(2);
        assert!(c.is_eligible(&rested, true));
        assert!(!c.is_eligible(&tired, true));
        assert!(c.is_eligible(&tired, false));
    }
}
