//! Breadth-first cascade propagation across operational transmission links.

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::effects::NodeProfile;
use super::event::EventLogEntry;
use super::rng::Mulberry32;
use super::types::NodeStates;
use crate::topology::{Catalog, GridNode};

/// Node adjacency over operational edges, by catalog index.
///
/// Each node's neighbour list follows edge catalog order. Parallel edges
/// appear once per edge.
#[derive(Debug, Clone)]
pub struct Adjacency {
    neighbours: Vec<Vec<usize>>,
}

impl Adjacency {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut neighbours = vec![Vec::new(); catalog.nodes().len()];
        for edge in catalog.edges().iter().filter(|e| e.is_operational()) {
            let (Some(a), Some(b)) = (
                catalog.node_position(&edge.from_node_id),
                catalog.node_position(&edge.to_node_id),
            ) else {
                continue;
            };
            neighbours[a].push(b);
            if a != b {
                neighbours[b].push(a);
            }
        }
        Self { neighbours }
    }

    pub fn neighbours(&self, i: usize) -> &[usize] {
        self.neighbours.get(i).map_or(&[], Vec::as_slice)
    }
}

/// Probability that a cascade spreads into a node.
pub fn spread_probability(profile: &NodeProfile) -> f64 {
    let base = if profile.critical { 0.25 } else { 0.15 };
    base * (0.35 + profile.vulnerability) * (1.0 - profile.cascade_resistance)
}

/// Read-only inputs shared by every cascade in a run.
pub(crate) struct Cascade<'a> {
    pub adjacency: &'a Adjacency,
    pub nodes: &'a [GridNode],
    pub profiles: &'a [NodeProfile],
}

impl Cascade<'_> {
    /// Spreads a failure outward from `origin`, which must already be marked
    /// failed.
    ///
    /// Failed and shielded neighbours are skipped without a draw. Every other
    /// candidate costs exactly one draw; on success it fails at `hour`, gets a
    /// `CASCADE_FAIL` entry, and joins the queue. Each node is expanded at
    /// most once. Returns the number of nodes failed by this cascade.
    pub(crate) fn propagate(
        &self,
        origin: usize,
        hour: usize,
        states: &mut NodeStates,
        rng: &mut Mulberry32,
        log: &mut Vec<EventLogEntry>,
    ) -> u32 {
        let mut queue = VecDeque::from([origin]);
        let mut visited = vec![false; self.nodes.len()];
        let mut spread = 0;

        while let Some(current) = queue.pop_front() {
            if std::mem::replace(&mut visited[current], true) {
                continue;
            }
            for &next in self.adjacency.neighbours(current) {
                if states.is_failed(next) {
                    continue;
                }
                let profile = &self.profiles[next];
                if profile.shielded {
                    trace!(node = %self.nodes[next].id, "cascade absorbed by shielded node");
                    continue;
                }
                if rng.next_unit() < spread_probability(profile) {
                    let node = &self.nodes[next];
                    states.fail(next, hour);
                    log.push(EventLogEntry::cascade_fail(
                        hour,
                        &node.id,
                        &node.zone_id,
                        &self.nodes[current].id,
                        &node.label,
                    ));
                    spread += 1;
                    queue.push_back(next);
                }
            }
        }

        if spread > 0 {
            debug!(
                hour,
                origin = %self.nodes[origin].id,
                spread,
                "cascade propagated"
            );
        }
        spread
    }
}
