//! Allocation (solution) model.
//!
//! An allocation maps clusters to drivers in the order clusters were
//! processed. Clusters that found no eligible driver are not part of the
//! mapping; they are listed separately with the reason.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fairness::VarianceByDimension;
use crate::heavy::HeavyThresholds;

/// Result of one allocation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Allocation {
    /// Committed assignments, in processing order.
    pub assignments: Vec<Assignment>,
    /// Clusters left without a driver, in processing order.
    pub unassigned: Vec<Unassigned>,
    /// Heavy-route thresholds used for this run (`None` with no clusters).
    pub thresholds: Option<HeavyThresholds>,
    /// Per-dimension variance after decay, before any assignment.
    pub initial_variance: VarianceByDimension,
    /// Per-dimension variance after the last assignment.
    pub final_variance: VarianceByDimension,
    /// Fairness penalty before any assignment.
    pub initial_penalty: f64,
    /// Fairness penalty after the last assignment.
    pub final_penalty: f64,
}

/// A committed cluster → driver assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned cluster ID.
    pub cluster_id: String,
    /// Receiving driver ID.
    pub driver_id: String,
    /// Whether the cluster was classified heavy.
    pub heavy: bool,
    /// Fairness penalty of the population right after this commit.
    pub penalty: f64,
}

/// A cluster that could not be assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unassigned {
    /// Cluster ID.
    pub cluster_id: String,
    /// Why no driver was selected.
    pub reason: UnassignedReason,
}

/// Why a cluster was left unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnassignedReason {
    /// The pool has no drivers.
    NoDrivers,
    /// Heavy cluster and every driver has reached the heavy-day limit.
    HeavyDayLimit,
}

/// Processing state of a cluster within a run.
///
/// `Pending` moves to exactly one terminal state; nothing moves back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterStatus {
    /// Not yet processed (or unknown to this allocation).
    Pending,
    /// Committed to the given driver.
    Assigned(String),
    /// Skipped for the given reason.
    Unassigned(UnassignedReason),
}

impl Assignment {
    /// Creates an assignment.
    pub fn new(cluster_id: impl Into<String>, driver_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            driver_id: driver_id.into(),
            heavy: false,
            penalty: 0.0,
        }
    }

    /// Marks the assignment as heavy.
    pub fn with_heavy(mut self, heavy: bool) -> Self {
        self.heavy = heavy;
        self
    }

    /// Sets the post-commit penalty.
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }
}

impl Unassigned {
    /// Creates an unassigned record.
    pub fn new(cluster_id: impl Into<String>, reason: UnassignedReason) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            reason,
        }
    }
}

impl Allocation {
    /// Creates an empty allocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Records an unassigned cluster.
    pub fn add_unassigned(&mut self, unassigned: Unassigned) {
        self.unassigned.push(unassigned);
    }

    /// Whether every processed cluster received a driver.
    pub fn is_complete(&self) -> bool {
        self.unassigned.is_empty()
    }

    /// Driver assigned to a cluster.
    pub fn driver_for(&self, cluster_id: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.cluster_id == cluster_id)
            .map(|a| a.driver_id.as_str())
    }

    /// Clusters assigned to a driver, in processing order.
    pub fn clusters_for_driver(&self, driver_id: &str) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|a| a.driver_id == driver_id)
            .map(|a| a.cluster_id.as_str())
            .collect()
    }

    /// Processing state of a cluster.
    pub fn status(&self, cluster_id: &str) -> ClusterStatus {
        if let Some(driver) = self.driver_for(cluster_id) {
            return ClusterStatus::Assigned(driver.to_string());
        }
        match self.unassigned.iter().find(|u| u.cluster_id == cluster_id) {
            Some(u) => ClusterStatus::Unassigned(u.reason.clone()),
            None => ClusterStatus::Pending,
        }
    }

    /// Cluster → driver pairs in processing order.
    pub fn to_mapping(&self) -> Vec<(&str, &str)> {
        self.assignments
            .iter()
            .map(|a| (a.cluster_id.as_str(), a.driver_id.as_str()))
            .collect()
    }

    /// Number of clusters assigned per driver.
    pub fn load_by_driver(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for a in &self.assignments {
            *counts.entry(a.driver_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_allocation() -> Allocation {
        let mut a = Allocation::new();
        a.add_assignment(Assignment::new("C1", "D1").with_heavy(true));
        a.add_assignment(Assignment::new("C2", "D2"));
        a.add_assignment(Assignment::new("C3", "D1"));
        a.add_unassigned(Unassigned::new("C4", UnassignedReason::HeavyDayLimit));
        a
    }

    #[test]
    fn test_lookup() {
        let a = sample_allocation();
        assert_eq!(a.driver_for("C1"), Some("D1"));
        assert_eq!(a.driver_for("C4"), None);
        assert_eq!(a.clusters_for_driver("D1"), vec!["C1", "C3"]);
        assert_eq!(a.assignment_count(), 3);
    }

    #[test]
    fn test_status() {
        let a = sample_allocation();
        assert_eq!(a.status("C2"), ClusterStatus::Assigned("D2".into()));
        assert_eq!(
            a.status("C4"),
            ClusterStatus::Unassigned(UnassignedReason::HeavyDayLimit)
        );
        assert_eq!(a.status("C9"), ClusterStatus::Pending);
        assert!(!a.is_complete());
    }

    #[test]
    fn test_mapping_keeps_processing_order() {
        let a = sample_allocation();
        assert_eq!(a.to_mapping(), vec![("C1", "D1"), ("C2", "D2"), ("C3", "D1")]);
    }

    #[test]
    fn test_load_by_driver() {
        let a = sample_allocation();
        let load = a.load_by_driver();
        assert_eq!(load["D1"], 2);
        assert_eq!(load["D2"], 1);
    }

    #[test]
    fn test_empty_allocation() {
        let a = Allocation::new();
        assert!(a.is_complete());
        assert!(a.to_mapping().is_empty());
    }
}
