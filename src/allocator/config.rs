//! Allocator configuration.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{AllocError, Result};
use crate::fairness::{DecayProfile, FairnessWeights};
use crate::heavy::HeavyRouteConfig;
use crate::models::{Cluster, DriverState};

/// How ties are broken when ordering clusters and candidate drivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieBreaker {
    /// Deterministic by ID (lexicographic).
    #[default]
    ById,
    /// Keep the order the inputs were supplied in.
    InputOrder,
    /// Drivers are visited in a seeded random order; clusters tie by ID.
    Seeded(u64),
}

impl TieBreaker {
    /// Processing order of clusters: descending magnitude, ties per strategy.
    ///
    /// Returns indices into `clusters`.
    pub fn cluster_order(&self, clusters: &[Cluster]) -> Vec<usize> {
        let magnitudes: Vec<f64> = clusters.iter().map(Cluster::magnitude).collect();
        let mut indices: Vec<usize> = (0..clusters.len()).collect();
        // Stable sort: equal keys keep input order.
        indices.sort_by(|&a, &b| {
            let by_magnitude = magnitudes[b].total_cmp(&magnitudes[a]);
            match self {
                TieBreaker::InputOrder => by_magnitude,
                TieBreaker::ById | TieBreaker::Seeded(_) => {
                    by_magnitude.then_with(|| clusters[a].id.cmp(&clusters[b].id))
                }
            }
        });
        indices
    }

    /// Order in which drivers are considered as candidates.
    ///
    /// Returns indices into `drivers`. The first candidate wins ties.
    pub fn driver_order(&self, drivers: &[DriverState]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..drivers.len()).collect();
        match self {
            TieBreaker::ById => indices.sort_by(|&a, &b| drivers[a].id.cmp(&drivers[b].id)),
            TieBreaker::InputOrder => {}
            TieBreaker::Seeded(seed) => {
                // Shuffle from a canonical order so the result does not
                // depend on input order.
                indices.sort_by(|&a, &b| drivers[a].id.cmp(&drivers[b].id));
                let mut rng = StdRng::seed_from_u64(*seed);
                indices.shuffle(&mut rng);
            }
        }
        indices
    }
}

/// Configuration of one allocation run.
///
/// # Example
/// ```
/// use fair_dispatch::allocator::{AllocatorConfig, TieBreaker};
///
/// let config = AllocatorConfig::default()
///     .with_tie_breaker(TieBreaker::InputOrder)
///     .with_max_consecutive_heavy_days(3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Per-dimension decay applied once at the start of the run.
    pub decay: DecayProfile,
    /// Penalty weights; also the set of measured dimensions.
    pub weights: FairnessWeights,
    /// Heavy-route classification and heavy-day limit.
    pub heavy: HeavyRouteConfig,
    /// Tie-breaking strategy.
    pub tie_breaker: TieBreaker,
    /// Whether to decay driver state before assigning (default: true).
    ///
    /// Disable for a same-day re-plan of state that was already decayed.
    pub apply_decay: bool,
    /// Among candidates with exactly equal penalty, prefer the one with the
    /// lowest raw cumulative magnitude before falling back to candidate
    /// order (default: true).
    ///
    /// Matters when every feature has degenerate bounds (all clusters alike),
    /// where the penalty cannot tell drivers apart.
    pub prefer_lighter_on_tie: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            decay: DecayProfile::default(),
            weights: FairnessWeights::default(),
            heavy: HeavyRouteConfig::default(),
            tie_breaker: TieBreaker::default(),
            apply_decay: true,
            prefer_lighter_on_tie: true,
        }
    }
}

impl AllocatorConfig {
    /// Parses a configuration from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the decay profile.
    pub fn with_decay(mut self, decay: DecayProfile) -> Self {
        self.decay = decay;
        self
    }

    /// Sets the penalty weights.
    pub fn with_weights(mut self, weights: FairnessWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the heavy-route configuration.
    pub fn with_heavy(mut self, heavy: HeavyRouteConfig) -> Self {
        self.heavy = heavy;
        self
    }

    /// Sets the heavy-day limit.
    pub fn with_max_consecutive_heavy_days(mut self, days: u32) -> Self {
        self.heavy.max_consecutive_heavy_days = days;
        self
    }

    /// Sets the tie-breaking strategy.
    pub fn with_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Enables or disables the decay step.
    pub fn with_decay_enabled(mut self, enabled: bool) -> Self {
        self.apply_decay = enabled;
        self
    }

    /// Enables or disables lighter-driver preference on exact ties.
    pub fn with_prefer_lighter_on_tie(mut self, enabled: bool) -> Self {
        self.prefer_lighter_on_tie = enabled;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// [`AllocError::InvalidConfig`] if a decay factor is outside (0, 1],
    /// a weight is negative or non-finite, or the percentile is outside [0, 1).
    pub fn validate(&self) -> Result<()> {
        for (dim, factor) in self.decay.all_factors() {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(AllocError::InvalidConfig(format!(
                    "decay factor for {dim} must be in (0, 1], got {factor}"
                )));
            }
        }
        for (dim, weight) in self.weights.iter() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AllocError::InvalidConfig(format!(
                    "weight for {dim} must be finite and non-negative, got {weight}"
                )));
            }
        }
        let p = self.heavy.percentile;
        if !(0.0..1.0).contains(&p) {
            return Err(AllocError::InvalidConfig(format!(
                "heavy percentile must be in [0, 1), got {p}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EffortVector;

    fn cluster(id: &str, weight: f64) -> Cluster {
        Cluster::new(id, EffortVector::new().with_scalar("physical_load", weight))
    }

    fn driver(id: &str) -> DriverState {
        DriverState::new(id, EffortVector::new().with_scalar("physical_load", 0.0))
    }

    #[test]
    fn test_default_config_is_valid() {
        let c = AllocatorConfig::default();
        assert!(c.validate().is_ok());
        assert!(c.apply_decay);
        assert!(c.prefer_lighter_on_tie);
        assert_eq!(c.tie_breaker, TieBreaker::ById);
        assert_eq!(c.heavy.max_consecutive_heavy_days, 2);
    }

    #[test]
    fn test_invalid_decay_factor() {
        let c = AllocatorConfig::default()
            .with_decay(DecayProfile::default().with_factor("physical_load", 1.5));
        assert!(matches!(c.validate(), Err(AllocError::InvalidConfig(_))));

        let c = AllocatorConfig::default().with_decay(DecayProfile::uniform(0.0));
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_invalid_weight() {
        let c = AllocatorConfig::default()
            .with_weights(FairnessWeights::default().with_weight("stair_load", -1.0));
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_invalid_percentile() {
        let mut c = AllocatorConfig::default();
        c.heavy.percentile = 1.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let c = AllocatorConfig::from_json_str(
            r#"{"tie_breaker": "InputOrder", "heavy": {"max_consecutive_heavy_days": 3}}"#,
        )
        .unwrap();
        assert_eq!(c.tie_breaker, TieBreaker::InputOrder);
        assert_eq!(c.heavy.max_consecutive_heavy_days, 3);
        assert_eq!(c.heavy.percentile, 0.75);
        assert_eq!(c.weights, FairnessWeights::default());
    }

    #[test]
    fn test_from_json_seeded() {
        let c = AllocatorConfig::from_json_str(r#"{"tie_breaker": {"Seeded": 7}}"#).unwrap();
        assert_eq!(c.tie_breaker, TieBreaker::Seeded(7));
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let err = AllocatorConfig::from_json_str(r#"{"heavy": {"percentile": 2.0}}"#).unwrap_err();
        assert!(matches!(err, AllocError::InvalidConfig(_)));
    }

    #[test]
    fn test_cluster_order_hardest_first() {
        let clusters = vec![cluster("A", 1.0), cluster("B", 9.0), cluster("C", 5.0)];
        let order = TieBreaker::ById.cluster_order(&clusters);
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_cluster_order_ties() {
        let clusters = vec![cluster("B", 5.0), cluster("A", 5.0)];
        assert_eq!(TieBreaker::ById.cluster_order(&clusters), vec![1, 0]);
        assert_eq!(TieBreaker::InputOrder.cluster_order(&clusters), vec![0, 1]);
    }

    #[test]
    fn test_driver_order() {
        let drivers = vec![driver("D3"), driver("D1"), driver("D2")];
        assert_eq!(TieBreaker::ById.driver_order(&drivers), vec![1, 2, 0]);
        assert_eq!(TieBreaker::InputOrder.driver_order(&drivers), vec![0, 1, 2]);
    }

    #[test]
    fn test_seeded_driver_order_is_reproducible() {
        let drivers: Vec<_> = (0..8).map(|i| driver(&format!("D{i}"))).collect();
        let a = TieBreaker::Seeded(42).driver_order(&drivers);
        let b = TieBreaker::Seeded(42).driver_order(&drivers);
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, (0..8).collect::<Vec<_>>());

        // Input order does not leak into the seeded order
        let reversed: Vec<_> = drivers.iter().rev().cloned().collect();
        let c = TieBreaker::Seeded(42).driver_order(&reversed);
        let ids_a: Vec<_> = a.iter().map(|&i| drivers[i].id.clone()).collect();
        let ids_c: Vec<_> = c.iter().map(|&i| reversed[i].id.clone()).collect();
        assert_eq!(ids_a, ids_c);
    }
}
