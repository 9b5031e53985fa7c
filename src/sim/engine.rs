//! Hourly failure and recovery state machine.

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, info_span, trace};

use super::cascade::{Adjacency, Cascade};
use super::clock::{Clock, Tick};
use super::effects::NodeProfile;
use super::event::EventLogEntry;
use super::metrics::{RunMetrics, RunTotals};
use super::rng::Mulberry32;
use super::types::{NodeStates, SimulationResult};
use crate::error::{Result, SimError};
use crate::ids::generate_run_id;
use crate::plan::Plan;
use crate::scenario::{Hazard, Scenario};
use crate::topology::{Catalog, NodeStatus};

/// Run-owned mutable state, indexed by catalog position.
struct RunState {
    nodes: NodeStates,
    overload_warned: Vec<bool>,
    shield_logged: Vec<bool>,
    uptime_hours: u64,
    history: Vec<Vec<NodeStatus>>,
    zone_outage_hours: Vec<u32>,
    events: Vec<EventLogEntry>,
    cascades: u32,
    peak_stress: f64,
}

impl RunState {
    fn new(node_count: usize, zone_count: usize, hours: usize) -> Self {
        Self {
            nodes: NodeStates::new(node_count),
            overload_warned: vec![false; node_count],
            shield_logged: vec![false; node_count],
            uptime_hours: 0,
            history: vec![Vec::with_capacity(hours); node_count],
            zone_outage_hours: vec![0; zone_count],
            events: Vec::new(),
            cascades: 0,
            peak_stress: 0.0,
        }
    }
}

/// One run of a plan against a scenario.
///
/// All plan-derived node quantities are resolved up front. The hourly loop
/// then only reads those profiles, the scenario curves, and a single
/// [`Mulberry32`] stream whose draw order is fixed:
///
/// 1. For each operational node in catalog order: one threshold draw if
///    unshielded, one shoulder draw only when the ratio sits between the
///    shoulder line and the threshold, one cascade draw per eligible
///    neighbour on failure, then (freeze only) one flood draw and its
///    cascade draws.
/// 2. For each failed node in catalog order that has been down for at least
///    two hours: one recovery draw.
pub struct Engine<'a> {
    catalog: &'a Catalog,
    plan: &'a Plan,
    scenario: &'a Scenario,
    seed: u32,
    profiles: Vec<NodeProfile>,
    adjacency: Adjacency,
    rng: Mulberry32,
    state: RunState,
}

impl<'a> Engine<'a> {
    /// Prepares a run.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidScenario`] if the scenario fails
    /// [`Scenario::validate`], and [`SimError::UnknownZone`] if a node's zone
    /// cannot be resolved.
    pub fn new(catalog: &'a Catalog, plan: &'a Plan, scenario: &'a Scenario, seed: u32) -> Result<Self> {
        scenario.validate()?;

        let profiles = catalog
            .nodes()
            .iter()
            .map(|node| {
                NodeProfile::resolve(catalog, plan, node)
                    .ok_or_else(|| SimError::UnknownZone(node.zone_id.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            catalog,
            plan,
            scenario,
            seed,
            profiles,
            adjacency: Adjacency::from_catalog(catalog),
            rng: Mulberry32::new(seed),
            state: RunState::new(
                catalog.nodes().len(),
                catalog.zones().len(),
                scenario.duration_hours,
            ),
        })
    }

    /// Resolved per-node quantities, in catalog order.
    pub fn profiles(&self) -> &[NodeProfile] {
        &self.profiles
    }

    /// Simulates one hour and returns how many nodes are down at its end.
    pub fn step(&mut self, tick: Tick) -> usize {
        let t = tick.hour;
        let stress = tick.weather_stress;
        let hazard = self.scenario.hazard;
        let nodes = self.catalog.nodes();
        let cascade = Cascade {
            adjacency: &self.adjacency,
            nodes,
            profiles: &self.profiles,
        };
        let state = &mut self.state;
        let rng = &mut self.rng;

        for (i, node) in nodes.iter().enumerate() {
            if state.nodes.is_failed(i) {
                continue;
            }
            let p = &self.profiles[i];

            let heat = if hazard == Hazard::HeatDome {
                1.0 + p.heat_sensitivity * stress * 0.6
            } else {
                1.0
            };
            let load = p.zone_load_mw * tick.demand_multiplier * heat;

            let age = if hazard == Hazard::Freeze {
                1.0 + p.infra_age_index * 0.4
            } else {
                1.0
            };
            let capacity = p.capacity_mw * (1.0 - stress * 0.4 * p.vulnerability * age);
            let ratio = load / capacity.max(f64::EPSILON);
            state.peak_stress = state.peak_stress.max(ratio);

            let b = p.reliability_buffer;
            if ratio > 0.85 + b * 0.08 && !state.overload_warned[i] {
                state.overload_warned[i] = true;
                state.events.push(EventLogEntry::overload_warning(
                    t,
                    &node.id,
                    &node.zone_id,
                    &node.label,
                    ratio,
                ));
            }

            if p.shielded {
                if ratio >= 1.0 && !state.shield_logged[i] {
                    state.shield_logged[i] = true;
                    state.events.push(EventLogEntry::zone_shielded(
                        t,
                        &node.id,
                        &node.zone_id,
                        &node.label,
                        ratio,
                    ));
                }
            } else {
                let threshold = 1.0 + rng.next_unit() * 0.15 + b * 0.25;
                let shoulder = 0.92 + b * 0.07;
                let fails = ratio >= threshold || {
                    ratio > shoulder
                        && rng.next_unit() < 0.12 * p.vulnerability * (1.0 - b) * (1.0 - b * 0.7)
                };
                if fails {
                    trace!(hour = t, node = %node.id, ratio, "overload failure");
                    state.nodes.fail(i, t);
                    state.events.push(EventLogEntry::node_fail(
                        t,
                        &node.id,
                        &node.zone_id,
                        &node.label,
                        ratio,
                    ));
                    state.cascades += cascade.propagate(i, t, &mut state.nodes, rng, &mut state.events);
                }
            }

            if hazard == Hazard::Freeze
                && stress > 0.5
                && !state.nodes.is_failed(i)
                && !p.shielded
                && rng.next_unit() < p.flood_risk * (stress - 0.5) * 2.0
            {
                trace!(hour = t, node = %node.id, "flood damage");
                state.nodes.fail(i, t);
                state.events.push(EventLogEntry::flood_damage(
                    t,
                    &node.id,
                    &node.zone_id,
                    &node.label,
                ));
                state.cascades += cascade.propagate(i, t, &mut state.nodes, rng, &mut state.events);
            }
        }

        for (i, node) in nodes.iter().enumerate() {
            let Some(down) = state.nodes.hours_down(i, t) else {
                continue;
            };
            if down >= 2 && rng.next_unit() < self.profiles[i].recovery_chance {
                state.nodes.recover(i);
                state.events.push(EventLogEntry::node_recover(
                    t,
                    &node.id,
                    &node.zone_id,
                    &node.label,
                    down,
                ));
            }
        }

        let mut zone_down = vec![false; state.zone_outage_hours.len()];
        let mut down_now = 0;
        for i in 0..nodes.len() {
            let status = state.nodes.status(i);
            state.history[i].push(status);
            if status.is_failed() {
                zone_down[self.profiles[i].zone_index] = true;
                down_now += 1;
            } else {
                state.uptime_hours += 1;
            }
        }
        for (hours, down) in state.zone_outage_hours.iter_mut().zip(zone_down) {
            if down {
                *hours += 1;
            }
        }
        down_now
    }

    /// Runs every hour of the scenario and assembles the result.
    pub fn run(mut self) -> SimulationResult {
        let scenario = self.scenario;
        Clock::new(scenario).run(|tick| {
            self.step(tick);
        });
        self.finish()
    }

    fn finish(self) -> SimulationResult {
        let Self {
            catalog,
            plan,
            scenario,
            seed,
            state,
            ..
        } = self;

        let nodes_failed = state
            .history
            .iter()
            .filter(|h| h.iter().any(|s| s.is_failed()))
            .count() as u32;
        let income: Vec<f64> = catalog.zones().iter().map(|z| z.median_income).collect();

        let metrics = RunMetrics::from_totals(&RunTotals {
            node_count: catalog.nodes().len(),
            duration_hours: scenario.duration_hours,
            uptime_hours: state.uptime_hours,
            zone_outage_hours: &state.zone_outage_hours,
            zone_median_income: &income,
            total_capex_usd: plan.total_capex_usd(),
            peak_stress: state.peak_stress,
            nodes_failed,
            cascades: state.cascades,
        });

        let outage_by_zone: IndexMap<String, u32> = catalog
            .zones()
            .iter()
            .zip(&state.zone_outage_hours)
            .map(|(z, &h)| (z.id.clone(), h))
            .collect();
        let node_status_history: IndexMap<String, Vec<NodeStatus>> = catalog
            .nodes()
            .iter()
            .zip(state.history)
            .map(|(n, h)| (n.id.clone(), h))
            .collect();

        debug!(
            stability = metrics.stability_score,
            outage_hours = metrics.total_outage_hours,
            cascades = metrics.cascade_count,
            events = state.events.len(),
            "run complete"
        );

        SimulationResult {
            id: generate_run_id(plan.id(), &scenario.id, seed),
            plan_id: plan.id().to_string(),
            scenario_id: scenario.id.clone(),
            seed,
            metrics,
            outage_by_zone,
            node_status_history,
            event_log: state.events,
            created_at: Utc::now(),
        }
    }
}

/// Runs `plan` against `scenario` with the given seed.
///
/// Pure given its inputs: the same `(catalog, plan, scenario, seed)` always
/// yields the same result apart from `created_at`.
///
/// # Errors
///
/// Returns an error before any simulation work if the scenario is invalid.
pub fn run_simulation(
    catalog: &Catalog,
    plan: &Plan,
    scenario: &Scenario,
    seed: u32,
) -> Result<SimulationResult> {
    let span = info_span!("run", plan = %plan.id(), scenario = %scenario.id, seed);
    let _guard = span.enter();
    Ok(Engine::new(catalog, plan, scenario, seed)?.run())
}
