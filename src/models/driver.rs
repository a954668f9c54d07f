//! Driver state model.
//!
//! A driver carries an accumulated effort vector and a streak counter of
//! consecutive heavy-route days. Both are loaded before a run, mutated only
//! by the allocator (decay, then at most one update per assigned cluster),
//! and handed back to the caller for persistence afterwards.

use serde::{Deserialize, Serialize};

use super::EffortVector;
use crate::fairness::DecayProfile;

/// Accumulated workload of one driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverState {
    /// Unique driver identifier.
    pub id: String,
    /// Cumulative assigned workload, less decay.
    pub cumulative_effort_vector: EffortVector,
    /// Number of heavy routes assigned on consecutive days.
    pub consecutive_heavy_days: u32,
}

impl DriverState {
    /// Creates a driver with the given cumulative vector and no heavy streak.
    pub fn new(id: impl Into<String>, cumulative_effort_vector: EffortVector) -> Self {
        Self {
            id: id.into(),
            cumulative_effort_vector,
            consecutive_heavy_days: 0,
        }
    }

    /// Creates a driver with zero workload shaped like `schema`.
    pub fn fresh(id: impl Into<String>, schema: &EffortVector) -> Self {
        Self::new(id, schema.zeroed())
    }

    /// Sets the heavy-day streak.
    pub fn with_heavy_days(mut self, days: u32) -> Self {
        self.consecutive_heavy_days = days;
        self
    }

    /// Whether this driver may take a cluster, given the heavy-day limit.
    #[inline]
    pub fn can_take(&self, heavy: bool, max_consecutive_heavy_days: u32) -> bool {
        !heavy || self.consecutive_heavy_days < max_consecutive_heavy_days
    }

    /// Commits an assignment: replaces the cumulative vector and updates
    /// the heavy streak (incremented for heavy clusters, reset otherwise).
    pub fn commit(&mut self, updated: EffortVector, heavy: bool) {
        self.cumulative_effort_vector = updated;
        if heavy {
            self.consecutive_heavy_days += 1;
        } else {
            self.consecutive_heavy_days = 0;
        }
    }

    /// Raw cumulative workload (sum of every leaf).
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.cumulative_effort_vector.magnitude()
    }
}

/// The driver population for one run.
///
/// Owned by the caller and passed explicitly into the allocator; history
/// carries across runs only through this value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverPool {
    drivers: Vec<DriverState>,
}

impl DriverPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a driver.
    pub fn with_driver(mut self, driver: DriverState) -> Self {
        self.drivers.push(driver);
        self
    }

    /// Adds a driver.
    pub fn push(&mut self, driver: DriverState) {
        self.drivers.push(driver);
    }

    /// Drivers in input order.
    pub fn drivers(&self) -> &[DriverState] {
        &self.drivers
    }

    pub(crate) fn drivers_mut(&mut self) -> &mut [DriverState] {
        &mut self.drivers
    }

    /// Finds a driver by ID.
    pub fn get(&self, id: &str) -> Option<&DriverState> {
        self.drivers.iter().find(|d| d.id == id)
    }

    /// Number of drivers.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Whether the pool has no drivers.
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Applies one period of decay to every driver's cumulative vector.
    pub fn apply_decay(&mut self, profile: &DecayProfile) {
        for driver in &mut self.drivers {
            profile.apply(&mut driver.cumulative_effort_vector);
        }
    }

    /// Consumes the pool, returning the drivers.
    pub fn into_drivers(self) -> Vec<DriverState> {
        self.drivers
    }
}

impl From<Vec<DriverState>> for DriverPool {
    fn from(drivers: Vec<DriverState>) -> Self {
        Self { drivers }
    }
}
