//! Greedy fairness-aware allocation and run metrics.
//!
//! # Algorithm
//!
//! `GreedyAllocator` processes clusters hardest-first and gives each one to
//! the eligible driver that leaves the population's workload variance
//! lowest. It is not globally optimal, but it is deterministic and fast.
//!
//! # Report
//!
//! `FairnessReport` summarizes a run: assignment counts, penalty and
//! variance change, workload spread, and heavy-streak exposure.

mod config;
mod greedy;
mod report;

pub use config::{AllocatorConfig, TieBreaker};
pub use greedy::GreedyAllocator;
pub use report::FairnessReport;
