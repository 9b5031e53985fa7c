//! Run output and per-run node state.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::event::EventLogEntry;
use super::metrics::RunMetrics;
use crate::topology::NodeStatus;

/// Complete, immutable output of one run.
///
/// Maps iterate in catalog order. Every node's history holds exactly one
/// entry per scenario hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Derived from plan id, scenario id, and seed.
    pub id: String,
    pub plan_id: String,
    pub scenario_id: String,
    pub seed: u32,
    pub metrics: RunMetrics,
    /// Hours during which at least one node in the zone was down.
    pub outage_by_zone: IndexMap<String, u32>,
    pub node_status_history: IndexMap<String, Vec<NodeStatus>>,
    pub event_log: Vec<EventLogEntry>,
    pub created_at: DateTime<Utc>,
}

/// Mutable failure state of every node during a run, indexed by catalog
/// position.
#[derive(Debug, Clone)]
pub(crate) struct NodeStates {
    failed: Vec<bool>,
    failed_at: Vec<Option<usize>>,
}

impl NodeStates {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            failed: vec![false; len],
            failed_at: vec![None; len],
        }
    }

    pub(crate) fn is_failed(&self, i: usize) -> bool {
        self.failed[i]
    }

    pub(crate) fn fail(&mut self, i: usize, hour: usize) {
        self.failed[i] = true;
        self.failed_at[i] = Some(hour);
    }

    pub(crate) fn recover(&mut self, i: usize) {
        self.failed[i] = false;
        self.failed_at[i] = None;
    }

    /// Hours since the node last failed, or `None` if it is up.
    pub(crate) fn hours_down(&self, i: usize, hour: usize) -> Option<usize> {
        if !self.failed[i] {
            return None;
        }
        Some(self.failed_at[i].map_or(0, |at| hour.saturating_sub(at)))
    }

    pub(crate) fn status(&self, i: usize) -> NodeStatus {
        if self.failed[i] {
            NodeStatus::Failed
        } else {
            NodeStatus::Operational
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_and_recover_track_downtime() {
        let mut s = NodeStates::new(2);
        assert_eq!(s.hours_down(0, 5), None);
        s.fail(0, 3);
        assert!(s.is_failed(0));
        assert_eq!(s.status(0), NodeStatus::Failed);
        assert_eq!(s.hours_down(0, 5), Some(2));
        s.recover(0);
        assert_eq!(s.hours_down(0, 6), None);
        assert_eq!(s.status(1), NodeStatus::Operational);
    }
}
