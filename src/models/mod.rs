//! Allocation domain models.
//!
//! Provides the data types consumed and produced by the allocator:
//! effort vectors, clusters, driver state, and the resulting allocation.
//!
//! # Domain Mappings
//!
//! | fair-dispatch | Delivery operations | Generic scheduling |
//! |---------------|---------------------|--------------------|
//! | Cluster | Route group | Task |
//! | DriverState | Driver + history | Resource |
//! | EffortVector | Workload features | Processing time |
//! | Allocation | Daily dispatch plan | Schedule |

mod allocation;
mod cluster;
mod driver;
mod effort;

pub use allocation::{Allocation, Assignment, ClusterStatus, Unassigned, UnassignedReason};
pub use cluster::Cluster;
pub use driver::{DriverPool, DriverState};
pub use effort::{dimension, DimensionValue, EffortVector, FeatureKey};
