//! Fairness-aware greedy allocator.
//!
//! # Algorithm
//!
//! 1. Validate inputs (no state is touched if this fails).
//! 2. Decay every driver's cumulative vector.
//! 3. Estimate bounds and heavy thresholds from the clusters.
//! 4. Sort clusters by descending magnitude (hardest first).
//! 5. For each cluster, score every eligible driver by the fairness penalty
//!    the population would have if that driver took the cluster, and commit
//!    the lowest. Drivers at the heavy-day limit are skipped for heavy
//!    clusters; if nobody is eligible the cluster stays unassigned.
//!
//! # Complexity
//! O(c · d² · k) where c=clusters, d=drivers, k=measured dimensions. Each
//! candidate is scored against a read-only magnitude snapshot with only its
//! own row substituted, so no population copies are made.

use tracing::{debug, info, warn};

use super::AllocatorConfig;
use crate::error::{AllocError, Result};
use crate::fairness::{penalties_tied, Bounds, FairnessEvaluator, MagnitudeTable};
use crate::heavy::HeavyRouteClassifier;
use crate::models::{
    Allocation, Assignment, Cluster, DriverPool, EffortVector, Unassigned, UnassignedReason,
};
use crate::validation::validate_input;

/// Greedy cluster → driver allocator minimizing workload variance.
///
/// # Example
///
/// ```
/// use fair_dispatch::allocator::GreedyAllocator;
/// use fair_dispatch::models::{Cluster, DriverPool, DriverState, EffortVector};
///
/// let effort = |w: f64| {
///     EffortVector::new()
///         .with_feature("physical_load", "total_weight", w)
///         .with_feature("stair_load", "avg_floor", 1.0)
///         .with_feature("traffic_stress", "traffic_index", 0.5)
///         .with_feature("route_distance", "total_duration", w * 60.0)
///         .with_scalar("cognitive_density", 1.0)
/// };
/// let clusters = vec![Cluster::new("C1", effort(80.0)), Cluster::new("C2", effort(20.0))];
/// let mut pool = DriverPool::new()
///     .with_driver(DriverState::fresh("D1", &effort(0.0)))
///     .with_driver(DriverState::fresh("D2", &effort(0.0)));
///
/// let allocation = GreedyAllocator::default().allocate(&clusters, &mut pool).unwrap();
/// assert_eq!(allocation.driver_for("C1"), Some("D1"));
/// assert_eq!(allocation.driver_for("C2"), Some("D2"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedyAllocator {
    config: AllocatorConfig,
}

struct Candidate {
    index: usize,
    penalty: f64,
    magnitude: f64,
    updated: EffortVector,
    row: Vec<f64>,
}

impl GreedyAllocator {
    /// Creates an allocator.
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    /// The allocator's configuration.
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Runs one allocation round, mutating `pool` in place.
    ///
    /// # Errors
    /// - [`AllocError::InvalidConfig`] for out-of-range settings.
    /// - [`AllocError::InvalidInput`] for duplicate IDs, schema mismatches,
    ///   non-finite values, or missing required features.
    ///
    /// On error `pool` is unchanged.
    pub fn allocate(&self, clusters: &[Cluster], pool: &mut DriverPool) -> Result<Allocation> {
        self.config.validate()?;
        validate_input(
            clusters,
            pool.drivers(),
            &self.config.heavy,
            &self.config.weights,
        )
        .map_err(AllocError::InvalidInput)?;

        if clusters.is_empty() {
            debug!("No clusters to allocate");
            return Ok(Allocation::new());
        }

        if self.config.apply_decay {
            pool.apply_decay(&self.config.decay);
        }

        let mut run = AllocationRun::prepare(&self.config, clusters, pool)?;

        let mut allocation = Allocation::new();
        allocation.thresholds = run.classifier.thresholds();
        allocation.initial_variance = run.table.variances();
        allocation.initial_penalty = run.table.penalty();

        info!(
            clusters = clusters.len(),
            drivers = pool.len(),
            initial_penalty = allocation.initial_penalty,
            thresholds = ?allocation.thresholds,
            "Starting allocation"
        );

        for ci in self.config.tie_breaker.cluster_order(clusters) {
            let cluster = &clusters[ci];
            let heavy = run.classifier.is_heavy(&cluster.effort)?;

            let Some(best) = self.select_driver(&run, cluster, heavy, pool)? else {
                let reason = if pool.is_empty() {
                    UnassignedReason::NoDrivers
                } else {
                    UnassignedReason::HeavyDayLimit
                };
                warn!(cluster = %cluster.id, heavy, ?reason, "No eligible driver, cluster left unassigned");
                allocation.add_unassigned(Unassigned::new(cluster.id.clone(), reason));
                continue;
            };

            let penalty_before = run.table.penalty();
            let driver = &mut pool.drivers_mut()[best.index];
            driver.commit(best.updated, heavy);
            run.table.replace(best.index, best.row);

            debug!(
                cluster = %cluster.id,
                driver = %driver.id,
                heavy,
                heavy_days = driver.consecutive_heavy_days,
                penalty_before,
                penalty_after = best.penalty,
                "Cluster assigned"
            );

            allocation.add_assignment(
                Assignment::new(cluster.id.clone(), driver.id.clone())
                    .with_heavy(heavy)
                    .with_penalty(best.penalty),
            );
        }

        allocation.final_variance = run.table.variances();
        allocation.final_penalty = run.table.penalty();

        info!(
            assigned = allocation.assignments.len(),
            unassigned = allocation.unassigned.len(),
            final_penalty = allocation.final_penalty,
            "Allocation finished"
        );

        Ok(allocation)
    }

    /// Scores every eligible driver for `cluster` and returns the best.
    ///
    /// Penalties within [`penalties_tied`] tolerance are equal. A candidate
    /// replaces the incumbent only with a strictly lower penalty, or, with
    /// `prefer_lighter_on_tie`, an equal penalty and a strictly lower raw
    /// cumulative magnitude. Remaining ties keep the earlier candidate in
    /// tie-break order.
    fn select_driver(
        &self,
        run: &AllocationRun,
        cluster: &Cluster,
        heavy: bool,
        pool: &DriverPool,
    ) -> Result<Option<Candidate>> {
        let mut best: Option<Candidate> = None;

        for &di in &run.driver_order {
            let driver = &pool.drivers()[di];
            if !run.classifier.is_eligible(driver, heavy) {
                continue;
            }

            let updated = driver.cumulative_effort_vector.add(&cluster.effort)?;
            let row = run.evaluator.magnitudes(&updated, &run.bounds)?;
            let penalty = run.table.penalty_with(di, &row);
            let magnitude = driver.magnitude();

            let better = match &best {
                None => penalty < f64::INFINITY,
                Some(current) => {
                    if penalties_tied(penalty, current.penalty) {
                        self.config.prefer_lighter_on_tie && magnitude < current.magnitude
                    } else {
                        penalty < current.penalty
                    }
                }
            };

            if better {
                best = Some(Candidate {
                    index: di,
                    penalty,
                    magnitude,
                    updated,
                    row,
                });
            }
        }

        Ok(best)
    }
}

/// Per-run state fixed before the first assignment.
///
/// Bounds, thresholds and candidate order stay frozen for the run; only the
/// magnitude table changes, one row per commit.
struct AllocationRun {
    bounds: Bounds,
    classifier: HeavyRouteClassifier,
    evaluator: FairnessEvaluator,
    table: MagnitudeTable,
    driver_order: Vec<usize>,
}

impl AllocationRun {
    fn prepare(config: &AllocatorConfig, clusters: &[Cluster], pool: &DriverPool) -> Result<Self> {
        let bounds = Bounds::from_clusters(clusters);
        let classifier = HeavyRouteClassifier::fit(clusters, &config.heavy)?;
        let evaluator = FairnessEvaluator::new(config.weights.clone());
        let table = MagnitudeTable::build(&evaluator, pool.drivers(), &bounds)?;
        let driver_order = config.tie_breaker.driver_order(pool.drivers());
        Ok(Self {
            bounds,
            classifier,
            evaluator,
            table,
            driver_order,
        })
    }
}
