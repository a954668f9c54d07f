//! Fairness measurement.
//!
//! Normalization bounds, workload decay, and the variance-based fairness
//! penalty that the allocator minimizes.
//!
//! # Usage
//!
//! ```
//! use fair_dispatch::fairness::{Bounds, FairnessEvaluator};
//! use fair_dispatch::models::{DriverState, EffortVector};
//!
//! let light = EffortVector::new()
//!     .with_feature("physical_load", "total_weight", 10.0)
//!     .with_feature("stair_load", "avg_floor", 1.0)
//!     .with_feature("traffic_stress", "traffic_index", 0.2)
//!     .with_feature("route_distance", "total_duration", 600.0)
//!     .with_scalar("cognitive_density", 1.0);
//! let heavy = EffortVector::new()
//!     .with_feature("physical_load", "total_weight", 90.0)
//!     .with_feature("stair_load", "avg_floor", 4.0)
//!     .with_feature("traffic_stress", "traffic_index", 0.8)
//!     .with_feature("route_distance", "total_duration", 3600.0)
//!     .with_scalar("cognitive_density", 3.0);
//!
//! let bounds = Bounds::from_vectors([&light, &heavy]);
//! let drivers = vec![DriverState::new("D1", light), DriverState::new("D2", heavy)];
//!
//! let evaluator = FairnessEvaluator::default();
//! let variance = evaluator.variance(&drivers, &bounds).unwrap();
//! assert!(evaluator.penalty(&variance) > 0.0);
//! ```

mod bounds;
mod decay;
mod evaluator;

pub use bounds::{normalize, Bounds, FeatureRange};
pub use decay::DecayProfile;
pub use evaluator::{
    penalties_tied, population_variance, FairnessEvaluator, FairnessWeights, MagnitudeTable,
    VarianceByDimension, PENALTY_TIE_TOLERANCE,
};
