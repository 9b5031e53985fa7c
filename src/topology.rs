//! Static topology catalog: zones, substations, and transmission links.
//!
//! The catalog is loaded once (see [`crate::config`]) and never mutated by a
//! run. Per-run node state lives in the engine's own arena and is surfaced
//! only through [`crate::sim::types::SimulationResult`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Operating status of a node, either as a static catalog baseline or as a
/// per-hour entry in a run's status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Operational,
    Failed,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::Failed => "failed",
        }
    }

    pub fn is_failed(self) -> bool {
        self == Self::Failed
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static status of a transmission link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    #[default]
    Operational,
    Failed,
}

/// A geographic planning unit with socioeconomic and infrastructure attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Zone {
    pub id: String,
    pub name: String,
    /// Ground-plane footprint as `[x, z]` pairs. Presentation only.
    #[serde(default)]
    pub polygon: Vec<[f64; 2]>,
    pub population: u64,
    /// Median household income (USD).
    pub median_income: f64,
    /// 0 to 1, where 1 is the oldest, most degraded infrastructure.
    pub infra_age_index: f64,
    /// Baseline load under normal conditions (MW).
    pub base_load_mw: f64,
    /// 0 to 1, where 1 is the most exposed to outages.
    pub vulnerability: f64,
    /// 0 to 1, how strongly cooling load spikes under heat stress.
    pub heat_sensitivity: f64,
    /// 0 to 1, likelihood of discrete flood damage during storm peaks.
    pub flood_risk: f64,
}

/// A substation: the unit of failure and recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridNode {
    pub id: String,
    pub label: String,
    pub zone_id: String,
    pub capacity_mw: f64,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub status: NodeStatus,
}

/// A transmission link. Only used for cascade adjacency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridEdge {
    pub id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    pub max_flow_mw: f64,
    #[serde(default)]
    pub status: EdgeStatus,
}

impl GridEdge {
    pub fn is_operational(&self) -> bool {
        self.status == EdgeStatus::Operational
    }
}

/// Immutable set of zones, nodes, and edges with id lookups.
///
/// Construction checks referential integrity, so every node's zone and every
/// edge's endpoints are guaranteed to resolve.
#[derive(Debug, Clone)]
pub struct Catalog {
    zones: Vec<Zone>,
    nodes: Vec<GridNode>,
    edges: Vec<GridEdge>,
    zone_index: HashMap<String, usize>,
    node_index: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids and dangling references.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptyCatalog`] when there are no zones or nodes,
    /// [`SimError::DuplicateId`] on repeated ids, and
    /// [`SimError::UnknownZone`] / [`SimError::UnknownNode`] on dangling
    /// references.
    pub fn new(zones: Vec<Zone>, nodes: Vec<GridNode>, edges: Vec<GridEdge>) -> Result<Self> {
        if zones.is_empty() {
            return Err(SimError::EmptyCatalog("zones"));
        }
        if nodes.is_empty() {
            return Err(SimError::EmptyCatalog("nodes"));
        }

        let zone_index = index_by_id(zones.iter().map(|z| z.id.as_str()), "zone")?;
        let node_index = index_by_id(nodes.iter().map(|n| n.id.as_str()), "node")?;
        index_by_id(edges.iter().map(|e| e.id.as_str()), "edge")?;

        if let Some(node) = nodes.iter().find(|n| !zone_index.contains_key(&n.zone_id)) {
            return Err(SimError::UnknownZone(node.zone_id.clone()));
        }
        for edge in &edges {
            for end in [&edge.from_node_id, &edge.to_node_id] {
                if !node_index.contains_key(end) {
                    return Err(SimError::UnknownNode(end.clone()));
                }
            }
        }

        Ok(Self {
            zones,
            nodes,
            edges,
            zone_index,
            node_index,
        })
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GridEdge] {
        &self.edges
    }

    pub fn zone(&self, id: &str) -> Option<&Zone> {
        self.zone_index.get(id).map(|&i| &self.zones[i])
    }

    pub fn node(&self, id: &str) -> Option<&GridNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Arena index of a zone, stable for the lifetime of the catalog.
    pub fn zone_position(&self, id: &str) -> Option<usize> {
        self.zone_index.get(id).copied()
    }

    /// Arena index of a node, stable for the lifetime of the catalog.
    pub fn node_position(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    /// Zone owning the given node.
    pub fn zone_of(&self, node: &GridNode) -> Option<&Zone> {
        self.zone(&node.zone_id)
    }
}

fn index_by_id<'a>(
    ids: impl Iterator<Item = &'a str>,
    kind: &'static str,
) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if index.insert(id.to_string(), i).is_some() {
            return Err(SimError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}
