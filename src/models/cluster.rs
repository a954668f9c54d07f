//! Cluster (unit of delivery work) model.
//!
//! A cluster is a pre-computed group of delivery stops served by one driver
//! on one route. The allocator only sees its effort vector; how the stops
//! were grouped and measured happens upstream.

use serde::{Deserialize, Serialize};

use super::EffortVector;

/// A schedulable unit of delivery work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique cluster identifier.
    pub id: String,
    /// Workload of this cluster. Immutable for the duration of a run.
    pub effort: EffortVector,
}

impl Cluster {
    /// Creates a cluster.
    pub fn new(id: impl Into<String>, effort: EffortVector) -> Self {
        Self {
            id: id.into(),
            effort,
        }
    }

    /// Difficulty ranking key (sum of every leaf).
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.effort.magnitude()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_magnitude() {
        let c = Cluster::new(
            "C1",
            EffortVector::new()
                .with_feature("physical_load", "total_weight", 30.0)
                .with_scalar("cognitive_density", 2.0),
        );
        assert_eq!(c.id, "C1");
        assert!((c.magnitude() - 32.0).abs() < 1e-10);
    }
}
