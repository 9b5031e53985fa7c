//! Effect resolution: derive effective node and zone quantities from the
//! static catalog and a plan's projects.
//!
//! Every function here is pure. Unknown ids resolve to conservative
//! defaults instead of failing, and every output is clamped to its domain.
//!
//! Node-level quantities match a project when it targets the node directly
//! or targets the node's zone. Zone-level quantities match only on the
//! project's zone.

use tracing::trace;

use crate::plan::Plan;
use crate::topology::{Catalog, GridNode};

/// Reliability buffer at or above which a node is shielded.
pub const SHIELD_THRESHOLD: f64 = 0.25;

pub const DEFAULT_ZONE_LOAD_MW: f64 = 0.0;
pub const DEFAULT_VULNERABILITY: f64 = 0.5;
pub const DEFAULT_CASCADE_RESISTANCE: f64 = 0.0;
pub const DEFAULT_RELIABILITY_BUFFER: f64 = 0.0;
pub const DEFAULT_RECOVERY_CHANCE: f64 = 0.03;
pub const DEFAULT_CAPACITY_MW: f64 = 0.0;

const MAX_CASCADE_RESISTANCE: f64 = 0.8;
const MAX_RELIABILITY_BUFFER: f64 = 0.85;
const MAX_RECOVERY_CHANCE: f64 = 0.75;
const BASE_RECOVERY_CHANCE: f64 = 0.08;

fn lookup_node<'a>(catalog: &'a Catalog, node_id: &str) -> Option<&'a GridNode> {
    let node = catalog.node(node_id);
    if node.is_none() {
        trace!(node_id, "unknown node, using default");
    }
    node
}

/// Base capacity plus matching capacity boosts, derated for EV load.
///
/// The EV derate removes `1% × ev_adoption_rate` of the boosted capacity and
/// never takes it below 85% of the boosted figure.
pub fn effective_node_capacity(catalog: &Catalog, plan: &Plan, node_id: &str) -> f64 {
    let Some(node) = lookup_node(catalog, node_id) else {
        return DEFAULT_CAPACITY_MW;
    };
    let boosted = node.capacity_mw
        + plan
            .projects()
            .iter()
            .filter(|p| p.targets_node(&node.id, &node.zone_id))
            .map(|p| p.effects.capacity_boost_mw())
            .sum::<f64>();
    let ev = plan.assumptions().ev_adoption_rate;
    (boosted - 0.01 * ev * boosted).max(boosted * 0.85)
}

/// Zone base load scaled by growth and EV adoption and reduced by demand
/// response projects in the zone. Never negative.
pub fn effective_zone_load(catalog: &Catalog, plan: &Plan, zone_id: &str) -> f64 {
    let Some(zone) = catalog.zone(zone_id) else {
        trace!(zone_id, "unknown zone, using default load");
        return DEFAULT_ZONE_LOAD_MW;
    };
    let a = plan.assumptions();
    let scaled = zone.base_load_mw
        * (1.0 + a.population_growth_rate / 100.0)
        * (1.0 + 0.25 * a.ev_adoption_rate);
    plan.projects()
        .iter()
        .filter(|p| p.targets_zone(zone_id))
        .fold(scaled, |load, p| {
            load * (1.0 - p.effects.demand_reduction_factor())
        })
        .max(0.0)
}

/// Zone vulnerability after reductions from projects in the zone.
pub fn zone_vulnerability(catalog: &Catalog, plan: &Plan, zone_id: &str) -> f64 {
    let Some(zone) = catalog.zone(zone_id) else {
        trace!(zone_id, "unknown zone, using default vulnerability");
        return DEFAULT_VULNERABILITY;
    };
    let reduction: f64 = plan
        .projects()
        .iter()
        .filter(|p| p.targets_zone(zone_id))
        .map(|p| p.effects.vulnerability_reduction())
        .sum();
    (zone.vulnerability - reduction).clamp(0.0, 1.0)
}

/// Summed cascade resistance of matching projects, clamped to `[0, 0.8]`.
pub fn cascade_resistance(catalog: &Catalog, plan: &Plan, node_id: &str) -> f64 {
    let Some(node) = lookup_node(catalog, node_id) else {
        return DEFAULT_CASCADE_RESISTANCE;
    };
    plan.projects()
        .iter()
        .filter(|p| p.targets_node(&node.id, &node.zone_id))
        .map(|p| p.effects.cascade_resistance())
        .sum::<f64>()
        .clamp(0.0, MAX_CASCADE_RESISTANCE)
}

/// Weighted sum of matching project effects, clamped to `[0, 0.85]`.
///
/// Capacity boosts are weighed against the node's *catalog* capacity, and
/// each project's boost contributes at most 0.35.
pub fn reliability_buffer(catalog: &Catalog, plan: &Plan, node_id: &str) -> f64 {
    let Some(node) = lookup_node(catalog, node_id) else {
        return DEFAULT_RELIABILITY_BUFFER;
    };
    plan.projects()
        .iter()
        .filter(|p| p.targets_node(&node.id, &node.zone_id))
        .map(|p| {
            let e = &p.effects;
            let boost = e.capacity_boost_mw();
            let boost_term = if boost > 0.0 {
                (boost / node.capacity_mw * 0.25).min(0.35)
            } else {
                0.0
            };
            boost_term
                + e.vulnerability_reduction() * 0.9
                + e.cascade_resistance() * 0.8
                + e.recovery_speed_boost() * 0.35
                + e.demand_reduction_factor() * 0.7
        })
        .sum::<f64>()
        .clamp(0.0, MAX_RELIABILITY_BUFFER)
}

/// Shielded nodes skip overload, shoulder, flood, and cascade failures.
pub fn is_shielded(catalog: &Catalog, plan: &Plan, node_id: &str) -> bool {
    reliability_buffer(catalog, plan, node_id) >= SHIELD_THRESHOLD
}

/// Per-hour probability that a failed node is restored.
pub fn recovery_chance(catalog: &Catalog, plan: &Plan, node_id: &str) -> f64 {
    let Some(node) = lookup_node(catalog, node_id) else {
        return DEFAULT_RECOVERY_CHANCE;
    };
    plan.projects()
        .iter()
        .filter(|p| p.targets_node(&node.id, &node.zone_id))
        .map(|p| {
            let e = &p.effects;
            e.recovery_speed_boost() * 0.18
                + e.vulnerability_reduction() * 0.09
                + e.cascade_resistance() * 0.06
        })
        .fold(BASE_RECOVERY_CHANCE, |acc, x| acc + x)
        .clamp(0.0, MAX_RECOVERY_CHANCE)
}

/// Summed utility resilience of projects in the zone, clamped to `[0, 1]`.
/// Presentation only.
pub fn utility_resilience(plan: &Plan, zone_id: &str) -> f64 {
    plan.projects()
        .iter()
        .filter(|p| p.targets_zone(zone_id))
        .map(|p| p.effects.utility_resilience_boost())
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Every plan-derived quantity the hourly loop needs for one node,
/// resolved once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProfile {
    pub zone_index: usize,
    pub capacity_mw: f64,
    pub zone_load_mw: f64,
    pub vulnerability: f64,
    pub cascade_resistance: f64,
    pub reliability_buffer: f64,
    pub shielded: bool,
    pub recovery_chance: f64,
    pub critical: bool,
    pub heat_sensitivity: f64,
    pub infra_age_index: f64,
    pub flood_risk: f64,
}

impl NodeProfile {
    /// Resolves a catalog node against a plan.
    ///
    /// Returns `None` only if the node's zone is missing, which a validated
    /// [`Catalog`] rules out.
    pub fn resolve(catalog: &Catalog, plan: &Plan, node: &GridNode) -> Option<Self> {
        let zone_index = catalog.zone_position(&node.zone_id)?;
        let zone = &catalog.zones()[zone_index];
        let buffer = reliability_buffer(catalog, plan, &node.id);
        Some(Self {
            zone_index,
            capacity_mw: effective_node_capacity(catalog, plan, &node.id),
            zone_load_mw: effective_zone_load(catalog, plan, &node.zone_id),
            vulnerability: zone_vulnerability(catalog, plan, &node.zone_id),
            cascade_resistance: cascade_resistance(catalog, plan, &node.id),
            reliability_buffer: buffer,
            shielded: buffer >= SHIELD_THRESHOLD,
            recovery_chance: recovery_chance(catalog, plan, &node.id),
            critical: node.critical,
            heat_sensitivity: zone.heat_sensitivity,
            infra_age_index: zone.infra_age_index,
            flood_risk: zone.flood_risk,
        })
    }
}
