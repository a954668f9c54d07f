//! JSON snapshots of clusters, driver state, and assignments.
//!
//! # Formats
//!
//! Clusters: `{ "<cluster_id>": <effort vector>, ... }`
//!
//! Drivers: `{ "<driver_id>": { "cumulative_effort_vector": <effort vector>,
//! "consecutive_heavy_days": <u32> }, ... }`
//!
//! Assignments: `{ "<cluster_id>": "<driver_id>", ... }` in processing order.
//!
//! Object key order is preserved, so input order survives a load and
//! `TieBreaker::InputOrder` sees the document order.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::{Allocation, Cluster, DriverPool, DriverState, EffortVector};

#[derive(Debug, Serialize, Deserialize)]
struct DriverRecord {
    cumulative_effort_vector: EffortVector,
    #[serde(default)]
    consecutive_heavy_days: u32,
}

/// Parses clusters from a JSON document.
pub fn clusters_from_str(json: &str) -> Result<Vec<Cluster>> {
    let map: Map<String, Value> = serde_json::from_str(json)?;
    clusters_from_map(map)
}

/// Reads clusters from a JSON reader.
pub fn load_clusters<R: Read>(reader: R) -> Result<Vec<Cluster>> {
    let map: Map<String, Value> = serde_json::from_reader(reader)?;
    clusters_from_map(map)
}

fn clusters_from_map(map: Map<String, Value>) -> Result<Vec<Cluster>> {
    map.into_iter()
        .map(|(id, value)| -> Result<Cluster> {
            Ok(Cluster::new(id, serde_json::from_value(value)?))
        })
        .collect()
}

/// Parses driver state from a JSON document.
pub fn drivers_from_str(json: &str) -> Result<DriverPool> {
    let map: Map<String, Value> = serde_json::from_str(json)?;
    drivers_from_map(map)
}

/// Reads driver state from a JSON reader.
pub fn load_drivers<R: Read>(reader: R) -> Result<DriverPool> {
    let map: Map<String, Value> = serde_json::from_reader(reader)?;
    drivers_from_map(map)
}

fn drivers_from_map(map: Map<String, Value>) -> Result<DriverPool> {
    let drivers = map
        .into_iter()
        .map(|(id, value)| -> Result<DriverState> {
            let record: DriverRecord = serde_json::from_value(value)?;
            Ok(DriverState::new(id, record.cumulative_effort_vector)
                .with_heavy_days(record.consecutive_heavy_days))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(drivers.into())
}

/// Serializes driver state in the snapshot format.
pub fn drivers_to_json(pool: &DriverPool) -> Result<Value> {
    let mut map = Map::new();
    for d in pool.drivers() {
        let record = DriverRecord {
            cumulative_effort_vector: d.cumulative_effort_vector.clone(),
            consecutive_heavy_days: d.consecutive_heavy_days,
        };
        map.insert(d.id.clone(), serde_json::to_value(record)?);
    }
    Ok(Value::Object(map))
}

/// Writes driver state as pretty-printed JSON.
pub fn write_drivers<W: Write>(writer: W, pool: &DriverPool) -> Result<()> {
    serde_json::to_writer_pretty(writer, &drivers_to_json(pool)?)?;
    Ok(())
}

/// The cluster → driver mapping as a JSON object, in processing order.
pub fn assignments_to_json(allocation: &Allocation) -> Value {
    let map: Map<String, Value> = allocation
        .to_mapping()
        .into_iter()
        .map(|(c, d)| (c.to_string(), Value::String(d.to_string())))
        .collect();
    Value::Object(map)
}

/// Writes the cluster → driver mapping as pretty-printed JSON.
pub fn write_assignments<W: Write>(writer: W, allocation: &Allocation) -> Result<()> {
    serde_json::to_writer_pretty(writer, &assignments_to_json(allocation))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AllocError;
    use crate::models::{Assignment, FeatureKey};

    const CLUSTERS: &str = r#"{
        "C2": {"physical_load": {"total_weight": 12.5, "bulky_ratio": 0.1}, "cognitive_density": 3.0},
        "C1": {"physical_load": {"total_weight": 40.0, "bulky_ratio": 0.4}, "cognitive_density": 7.0}
    }"#;

    #[test]
    fn test_clusters_keep_document_order() {
        let clusters = clusters_from_str(CLUSTERS).unwrap();
        let ids: Vec<_> = clusters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["C2", "C1"]);
        assert_eq!(
            clusters[1]
                .effort
                .leaf(&FeatureKey::new("physical_load", "total_weight")),
            Some(40.0)
        );
        assert_eq!(
            clusters[0]
                .effort
                .leaf(&FeatureKey::scalar("cognitive_density")),
            Some(3.0)
        );
    }

    #[test]
    fn test_load_clusters_from_reader() {
        let clusters = load_clusters(CLUSTERS.as_bytes()).unwrap();
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_drivers_default_heavy_days() {
        let pool = drivers_from_str(
            r#"{
                "D1": {"cumulative_effort_vector": {"physical_load": 5.0}, "consecutive_heavy_days": 2},
                "D2": {"cumulative_effort_vector": {"physical_load": 0.0}}
            }"#,
        )
        .unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get("D1").unwrap().consecutive_heavy_days, 2);
        assert_eq!(pool.get("D2").unwrap().consecutive_heavy_days, 0);
    }

    #[test]
    fn test_driver_round_trip() {
        let pool: DriverPool = vec![
            DriverState::new(
                "D1",
                EffortVector::new().with_feature("stair_load", "avg_floor", 4.0),
            )
            .with_heavy_days(1),
            DriverState::new(
                "D0",
                EffortVector::new().with_feature("stair_load", "avg_floor", 0.0),
            ),
        ]
        .into();

        let mut buf = Vec::new();
        write_drivers(&mut buf, &pool).unwrap();
        let restored = load_drivers(buf.as_slice()).unwrap();
        assert_eq!(restored, pool);
    }

    #[test]
    fn test_assignments_json() {
        let mut a = Allocation::new();
        a.add_assignment(Assignment::new("C9", "D2"));
        a.add_assignment(Assignment::new("C1", "D1"));

        let mut buf = Vec::new();
        write_assignments(&mut buf, &a).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.find("C9").unwrap() < text.find("C1").unwrap());
        assert_eq!(assignments_to_json(&a)["C1"], "D1");
    }

    #[test]
    fn test_malformed_json() {
        let err = clusters_from_str(r#"{"C1": {"physical_load": "heavy"}}"#).unwrap_err();
        assert!(matches!(err, AllocError::Json(_)));
        assert!(drivers_from_str("[1, 2]").is_err());
    }
}
