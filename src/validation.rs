//! Input validation for allocation runs.
//!
//! Checks structural integrity of clusters and drivers before any state is
//! touched. Detects:
//! - Duplicate IDs
//! - Effort vectors whose schema differs from the run's reference schema
//! - Non-finite leaf values
//! - Missing features required by the heavy-route classifier
//! - Missing dimensions required by the fairness objective
//!
//! The reference schema is the first cluster's vector, or the first driver's
//! when there are no clusters.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::fairness::FairnessWeights;
use crate::heavy::HeavyRouteConfig;
use crate::models::{Cluster, DriverState, EffortVector};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two clusters or two drivers share the same ID.
    DuplicateId,
    /// An effort vector's dimensions or sub-features differ from the reference.
    SchemaMismatch,
    /// A leaf value is NaN or infinite.
    NonFiniteValue,
    /// A feature read by the heavy-route classifier is absent.
    MissingHeavyFeature,
    /// A dimension weighted by the fairness objective is absent.
    MissingWeightedDimension,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates the inputs of an allocation run.
///
/// Checks:
/// 1. No duplicate cluster IDs
/// 2. No duplicate driver IDs
/// 3. Every cluster and driver vector matches the reference schema
/// 4. Every leaf value is finite
/// 5. The reference schema has both heavy-route features
/// 6. The reference schema has every weighted dimension
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    clusters: &[Cluster],
    drivers: &[DriverState],
    heavy: &HeavyRouteConfig,
    weights: &FairnessWeights,
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut cluster_ids = HashSet::new();
    for c in clusters {
        if !cluster_ids.insert(c.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate cluster ID: {}", c.id),
            ));
        }
    }

    let mut driver_ids = HashSet::new();
    for d in drivers {
        if !driver_ids.insert(d.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate driver ID: {}", d.id),
            ));
        }
    }

    let reference = clusters
        .first()
        .map(|c| &c.effort)
        .or_else(|| drivers.first().map(|d| &d.cumulative_effort_vector));

    let Some(reference) = reference else {
        return finish(errors);
    };

    let vectors = clusters
        .iter()
        .map(|c| ("cluster", c.id.as_str(), &c.effort))
        .chain(
            drivers
                .iter()
                .map(|d| ("driver", d.id.as_str(), &d.cumulative_effort_vector)),
        );

    for (owner, id, vector) in vectors {
        if let Err(e) = reference.check_schema(vector) {
            errors.push(ValidationError::new(
                ValidationErrorKind::SchemaMismatch,
                format!("{owner} '{id}': {e}"),
            ));
        }
        if !vector.is_finite() {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonFiniteValue,
                format!("{owner} '{id}' has a non-finite effort value"),
            ));
        }
    }

    if !clusters.is_empty() {
        for key in [&heavy.physical_feature, &heavy.duration_feature] {
            if reference.leaf(key).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingHeavyFeature,
                    format!("Effort vectors have no heavy-route feature {key}"),
                ));
            }
        }
    }

    check_weighted_dimensions(reference, weights, &mut errors);

    finish(errors)
}

fn check_weighted_dimensions(
    reference: &EffortVector,
    weights: &FairnessWeights,
    errors: &mut Vec<ValidationError>,
) {
    for dim in weights.dimensions() {
        if reference.get(dim).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingWeightedDimension,
                format!("Effort vectors have no weighted dimension '{dim}'"),
            ));
        }
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_vector(scale: f64) -> EffortVector {
        EffortVector::new()
            .with_feature("physical_load", "total_weight", 10.0 * scale)
            .with_feature("stair_load", "avg_floor", 2.0 * scale)
            .with_feature("traffic_stress", "traffic_index", 0.5 * scale)
            .with_feature("route_distance", "total_duration", 900.0 * scale)
            .with_scalar("cognitive_density", scale)
    }

    fn sample_clusters() -> Vec<Cluster> {
        vec![
            Cluster::new("C1", full_vector(1.0)),
            Cluster::new("C2", full_vector(2.0)),
        ]
    }

    fn sample_drivers() -> Vec<DriverState> {
        vec![
            DriverState::fresh("D1", &full_vector(1.0)),
            DriverState::fresh("D2", &full_vector(1.0)),
        ]
    }

    fn run(clusters: &[Cluster], drivers: &[DriverState]) -> ValidationResult {
        validate_input(
            clusters,
            drivers,
            &HeavyRouteConfig::default(),
            &FairnessWeights::default(),
        )
    }

    #[test]
    fn test_valid_input() {
        assert!(run(&sample_clusters(), &sample_drivers()).is_ok());
    }

    #[test]
    fn test_empty_input() {
        assert!(run(&[], &[]).is_ok());
    }

    #[test]
    fn test_duplicate_cluster_id() {
        let clusters = vec![
            Cluster::new("C1", full_vector(1.0)),
            Cluster::new("C1", full_vector(2.0)),
        ];
        let errors = run(&clusters, &sample_drivers()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("cluster")));
    }

    #[test]
    fn test_duplicate_driver_id() {
        let drivers = vec![
            DriverState::fresh("D1", &full_vector(1.0)),
            DriverState::fresh("D1", &full_vector(1.0)),
        ];
        let errors = run(&sample_clusters(), &drivers).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("driver")));
    }

    #[test]
    fn test_driver_schema_mismatch() {
        let drivers = vec![DriverState::new(
            "D1",
            full_vector(1.0).with_feature("stair_load", "elevator_coverage", 0.0),
        )];
        let errors = run(&sample_clusters(), &drivers).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::SchemaMismatch && e.message.contains("D1")));
    }

    #[test]
    fn test_cluster_shape_mismatch() {
        let clusters = vec![
            Cluster::new("C1", full_vector(1.0)),
            Cluster::new("C2", full_vector(1.0).with_scalar("stair_load", 3.0)),
        ];
        let errors = run(&clusters, &sample_drivers()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::SchemaMismatch && e.message.contains("C2")));
    }

    #[test]
    fn test_non_finite_value() {
        let clusters = vec![Cluster::new(
            "C1",
            full_vector(1.0).with_scalar("cognitive_density", f64::NAN),
        )];
        let errors = run(&clusters, &sample_drivers()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NonFiniteValue));
    }

    #[test]
    fn test_missing_heavy_feature() {
        let v = EffortVector::new()
            .with_feature("physical_load", "total_weight", 1.0)
            .with_feature("stair_load", "avg_floor", 1.0)
            .with_feature("traffic_stress", "traffic_index", 1.0)
            .with_feature("route_distance", "total_distance", 1.0)
            .with_scalar("cognitive_density", 1.0);
        let clusters = vec![Cluster::new("C1", v.clone())];
        let drivers = vec![DriverState::fresh("D1", &v)];

        let errors = run(&clusters, &drivers).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::MissingHeavyFeature
                && e.message.contains("route_distance.total_duration")));
    }

    #[test]
    fn test_missing_weighted_dimension() {
        let v = EffortVector::new()
            .with_feature("physical_load", "total_weight", 1.0)
            .with_feature("route_distance", "total_duration", 1.0);
        let clusters = vec![Cluster::new("C1", v)];

        let errors = run(&clusters, &[]).unwrap_err();
        let missing = errors
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::MissingWeightedDimension)
            .count();
        assert_eq!(missing, 3); // stair_load, traffic_stress, cognitive_density
    }

    #[test]
    fn test_drivers_only_use_driver_schema() {
        // No clusters: heavy features are not required
        let v = EffortVector::new()
            .with_scalar("physical_load", 1.0)
            .with_scalar("stair_load", 1.0)
            .with_scalar("traffic_stress", 1.0)
            .with_scalar("route_distance", 1.0)
            .with_scalar("cognitive_density", 1.0);
        let drivers = vec![DriverState::new("D1", v)];
        assert!(run(&[], &drivers).is_ok());
    }
}
