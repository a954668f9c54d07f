//! Allocation quality metrics.
//!
//! Summarizes a finished run from its allocation and the final driver pool.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Assigned / Unassigned | Cluster counts by outcome |
//! | Heavy Assigned | Heavy clusters that received a driver |
//! | Penalty Reduction | Initial penalty − final penalty |
//! | Variance Change | Final − initial variance per dimension |
//! | Workload Spread | Max − min raw cumulative magnitude across drivers |
//! | Drivers At Limit | Drivers whose heavy streak reached the limit |

use std::collections::BTreeMap;

use crate::models::{Allocation, DriverPool};

/// Allocation performance indicators.
#[derive(Debug, Clone)]
pub struct FairnessReport {
    /// Number of clusters assigned.
    pub assigned: usize,
    /// Number of clusters left unassigned.
    pub unassigned: usize,
    /// Number of heavy clusters assigned.
    pub heavy_assigned: usize,
    /// Clusters per driver (drivers with none are listed with 0).
    pub clusters_by_driver: BTreeMap<String, usize>,
    /// Penalty before the first assignment.
    pub initial_penalty: f64,
    /// Penalty after the last assignment.
    pub final_penalty: f64,
    /// Final minus initial variance, per dimension.
    pub variance_change: BTreeMap<String, f64>,
    /// Largest raw cumulative magnitude across drivers.
    pub max_workload: f64,
    /// Smallest raw cumulative magnitude across drivers.
    pub min_workload: f64,
    /// Drivers whose heavy streak is at or above `heavy_day_limit`.
    pub drivers_at_heavy_limit: usize,
}

impl FairnessReport {
    /// Computes the report.
    ///
    /// # Arguments
    /// * `allocation` - The finished allocation.
    /// * `pool` - The driver pool after the run.
    /// * `heavy_day_limit` - Streak length at which drivers are excluded.
    pub fn calculate(allocation: &Allocation, pool: &DriverPool, heavy_day_limit: u32) -> Self {
        let mut clusters_by_driver: BTreeMap<String, usize> =
            pool.drivers().iter().map(|d| (d.id.clone(), 0)).collect();
        for (driver, count) in allocation.load_by_driver() {
            clusters_by_driver.insert(driver, count);
        }

        let heavy_assigned = allocation.assignments.iter().filter(|a| a.heavy).count();

        let variance_change = allocation
            .final_variance
            .iter()
            .map(|(d, after)| {
                let before = allocation.initial_variance.get(d).copied().unwrap_or(0.0);
                (d.clone(), after - before)
            })
            .collect();

        let (max_workload, min_workload) = if pool.is_empty() {
            (0.0, 0.0)
        } else {
            pool.drivers()
                .iter()
                .map(|d| d.magnitude())
                .fold((f64::NEG_INFINITY, f64::INFINITY), |(hi, lo), m| {
                    (hi.max(m), lo.min(m))
                })
        };

        let drivers_at_heavy_limit = pool
            .drivers()
            .iter()
            .filter(|d| d.consecutive_heavy_days >= heavy_day_limit)
            .count();

        Self {
            assigned: allocation.assignments.len(),
            unassigned: allocation.unassigned.len(),
            heavy_assigned,
            clusters_by_driver,
            initial_penalty: allocation.initial_penalty,
            final_penalty: allocation.final_penalty,
            variance_change,
            max_workload,
            min_workload,
            drivers_at_heavy_limit,
        }
    }

    /// Penalty removed by the run (negative if imbalance grew).
    pub fn penalty_reduction(&self) -> f64 {
        self.initial_penalty - self.final_penalty
    }

    /// Max minus min raw cumulative magnitude.
    pub fn workload_spread(&self) -> f64 {
        self.max_workload - self.min_workload
    }

    /// Whether the run meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_unassigned: usize, max_penalty: f64) -> bool {
        self.unassigned <= max_unassigned && self.final_penalty <= max_penalty
    }
}
