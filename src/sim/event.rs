//! Run event log entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What happened.
///
/// `ZoneOutage` and `ZoneRestore` are reserved for consumers and are never
/// emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    NodeFail,
    NodeRecover,
    CascadeFail,
    ZoneOutage,
    ZoneRestore,
    OverloadWarning,
    ZoneShielded,
    FloodDamage,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NodeFail => "NODE_FAIL",
            Self::NodeRecover => "NODE_RECOVER",
            Self::CascadeFail => "CASCADE_FAIL",
            Self::ZoneOutage => "ZONE_OUTAGE",
            Self::ZoneRestore => "ZONE_RESTORE",
            Self::OverloadWarning => "OVERLOAD_WARNING",
            Self::ZoneShielded => "ZONE_SHIELDED",
            Self::FloodDamage => "FLOOD_DAMAGE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One entry in a run's append-only event log.
///
/// Entries are in the order they were produced: by hour, then by
/// evaluation order within the hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub timestep: usize,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_node_id: Option<String>,
    pub message: String,
    pub severity: Severity,
}

fn pct(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

impl EventLogEntry {
    fn at_node(
        timestep: usize,
        kind: EventKind,
        severity: Severity,
        node_id: &str,
        zone_id: &str,
        message: String,
    ) -> Self {
        Self {
            timestep,
            kind,
            node_id: Some(node_id.to_string()),
            zone_id: Some(zone_id.to_string()),
            from_node_id: None,
            message,
            severity,
        }
    }

    pub fn overload_warning(t: usize, node_id: &str, zone_id: &str, label: &str, ratio: f64) -> Self {
        Self::at_node(
            t,
            EventKind::OverloadWarning,
            Severity::Warning,
            node_id,
            zone_id,
            format!("{label} approaching capacity ({} stressed)", pct(ratio)),
        )
    }

    pub fn zone_shielded(t: usize, node_id: &str, zone_id: &str, label: &str, ratio: f64) -> Self {
        Self::at_node(
            t,
            EventKind::ZoneShielded,
            Severity::Info,
            node_id,
            zone_id,
            format!(
                "{label} protected: project investments absorbed overload (stress={})",
                pct(ratio)
            ),
        )
    }

    pub fn node_fail(t: usize, node_id: &str, zone_id: &str, label: &str, ratio: f64) -> Self {
        Self::at_node(
            t,
            EventKind::NodeFail,
            Severity::Critical,
            node_id,
            zone_id,
            format!("{label} failed: load exceeded capacity (stress={})", pct(ratio)),
        )
    }

    pub fn flood_damage(t: usize, node_id: &str, zone_id: &str, label: &str) -> Self {
        Self::at_node(
            t,
            EventKind::FloodDamage,
            Severity::Critical,
            node_id,
            zone_id,
            format!("{label} damaged by flooding: storm stress exceeded drainage capacity"),
        )
    }

    pub fn node_recover(t: usize, node_id: &str, zone_id: &str, label: &str, hours_down: usize) -> Self {
        Self::at_node(
            t,
            EventKind::NodeRecover,
            Severity::Info,
            node_id,
            zone_id,
            format!("{label} restored after {hours_down}h outage"),
        )
    }

    /// Cascade entries carry the failed neighbour and its upstream source.
    pub fn cascade_fail(
        t: usize,
        node_id: &str,
        zone_id: &str,
        from_node_id: &str,
        label: &str,
    ) -> Self {
        Self {
            from_node_id: Some(from_node_id.to_string()),
            ..Self::at_node(
                t,
                EventKind::CascadeFail,
                Severity::Critical,
                node_id,
                zone_id,
                format!("Cascade failure: {label} failed due to overload from upstream failure"),
            )
        }
    }
}

impl fmt::Display for EventLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[h{:>5}] {:<16} {:<8} {}",
            self.timestep,
            self.kind.as_str(),
            format!("{:?}", self.severity).to_lowercase(),
            self.message
        )
    }
}
