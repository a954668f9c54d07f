//! Fairness-aware driver allocation for last-mile delivery.
//!
//! Assigns delivery clusters to drivers so cumulative workload stays
//! balanced over time. Workload is a multi-dimensional effort vector;
//! balance is measured as the weighted per-dimension variance of normalized
//! driver workloads.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `EffortVector`, `Cluster`, `DriverState`,
//!   `DriverPool`, `Allocation`
//! - **`fairness`**: Normalization bounds, decay, variance penalty
//! - **`heavy`**: Percentile-based heavy-route classification and the
//!   consecutive heavy-day limit
//! - **`allocator`**: Greedy allocator, its configuration, and run report
//! - **`validation`**: Input integrity checks (duplicate IDs, schema, finiteness)
//! - **`snapshot`**: JSON load/store of clusters, driver state, assignments
//!
//! # Quick Start
//!
//! ```
//! use fair_dispatch::allocator::{AllocatorConfig, GreedyAllocator};
//! use fair_dispatch::snapshot::{clusters_from_str, drivers_from_str};
//!
//! let clusters = clusters_from_str(r#"{
//!     "C1": {"physical_load": {"total_weight": 80.0}, "stair_load": 3.0,
//!            "traffic_stress": 0.6, "route_distance": {"total_duration": 5400.0},
//!            "cognitive_density": 4.0},
//!     "C2": {"physical_load": {"total_weight": 20.0}, "stair_load": 1.0,
//!            "traffic_stress": 0.2, "route_distance": {"total_duration": 1800.0},
//!            "cognitive_density": 1.0}
//! }"#).unwrap();
//! let zero = r#"{"physical_load": {"total_weight": 0.0}, "stair_load": 0.0,
//!     "traffic_stress": 0.0, "route_distance": {"total_duration": 0.0},
//!     "cognitive_density": 0.0}"#;
//! let mut pool = drivers_from_str(&format!(
//!     r#"{{"D1": {{"cumulative_effort_vector": {zero}}},
//!         "D2": {{"cumulative_effort_vector": {zero}}}}}"#
//! )).unwrap();
//!
//! let allocator = GreedyAllocator::new(AllocatorConfig::default());
//! let allocation = allocator.allocate(&clusters, &mut pool).unwrap();
//! assert_eq!(allocation.to_mapping(), vec![("C1", "D1"), ("C2", "D2")]);
//! ```
//!
//! # References
//!
//! - Jain, Chiu & Hawe (1984), "A Quantitative Measure of Fairness and
//!   Discrimination for Resource Allocation in Shared Computer Systems"
//! - Graham (1969), "Bounds on Multiprocessing Timing Anomalies" (LPT greedy)

pub mod allocator;
pub mod error;
pub mod fairness;
pub mod heavy;
pub mod models;
pub mod snapshot;
pub mod validation;

pub use error::{AllocError, Result};
