//! Error types for allocation runs.
//!
//! Structural problems (schema mismatches, unknown features, invalid input or
//! configuration) abort a run before any driver state is touched. Conditions
//! that the allocator handles locally, such as a cluster with no eligible
//! driver, are reported in the [`Allocation`](crate::models::Allocation)
//! instead of here.

use thiserror::Error;

use crate::models::FeatureKey;
use crate::validation::ValidationError;

/// Errors produced by the allocation pipeline.
#[derive(Debug, Error)]
pub enum AllocError {
    /// Two effort vectors do not share the same dimension/sub-feature layout.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A vector lacks a dimension the fairness objective measures.
    #[error("effort vector has no dimension '{0}'")]
    MissingDimension(String),

    /// A leaf feature was never observed while estimating bounds.
    #[error("no bounds recorded for feature {0}")]
    UnknownFeature(FeatureKey),

    /// A vector lacks a feature the heavy-route classifier reads.
    #[error("effort vector has no feature {0}")]
    MissingFeature(FeatureKey),

    /// Input validation found one or more problems.
    #[error("input validation failed with {} error(s)", .0.len())]
    InvalidInput(Vec<ValidationError>),

    /// Allocator configuration is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot file access failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AllocError>;
