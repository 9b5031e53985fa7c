//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gridcase_sim::config::{CatalogConfig, Dataset};
use gridcase_sim::plan::{Assumptions, Plan, Project, Role};
use gridcase_sim::scenario::{CurveProfile, Scenario};
use gridcase_sim::topology::{Catalog, EdgeStatus, GridEdge, GridNode, NodeStatus, Zone};

/// The built-in Austin dataset.
pub fn austin() -> Dataset {
    CatalogConfig::austin()
        .expect("austin preset parses")
        .build()
        .expect("austin preset builds")
}

/// Empty utility-planner plan with a fixed id.
pub fn empty_plan() -> Plan {
    Plan::new(
        "plan-empty",
        "Empty",
        Role::UtilityPlanner,
        Assumptions::default(),
    )
}

/// Plan holding every catalog project, with the budget raised to fit.
pub fn all_projects_plan(data: &Dataset) -> Plan {
    let capex: f64 = data.projects.iter().map(|p| p.capex_usd).sum();
    Plan::from_parts(
        "plan-all",
        "Everything",
        Role::UtilityPlanner,
        data.projects.clone(),
        Assumptions {
            budget_cap_usd: capex,
            ..Assumptions::default()
        },
    )
    .expect("catalog projects are unique")
}

/// Plan holding the given catalog projects, in order.
pub fn plan_with(data: &Dataset, ids: &[&str]) -> Plan {
    let projects: Vec<Project> = data.resolve_projects(ids).expect("known projects");
    Plan::from_parts(
        "plan-some",
        "Some",
        Role::UtilityPlanner,
        projects,
        Assumptions::default(),
    )
    .expect("unique projects")
}

/// A shortened built-in scenario.
pub fn short_scenario(profile: CurveProfile, hours: usize) -> Scenario {
    Scenario::from_profile(
        format!("sc-{}", profile.hazard()),
        "Short",
        "",
        profile,
        hours,
    )
}

/// Random connected topology: `zones` zones with one to three nodes each,
/// chained by a spanning path plus a few random extra links, one of them
/// failed.
pub fn synthetic_catalog(seed: u64, zones: usize) -> Catalog {
    let mut rng = StdRng::seed_from_u64(seed);

    let zone_list: Vec<Zone> = (0..zones)
        .map(|i| Zone {
            id: format!("z-{i}"),
            name: format!("Zone {i}"),
            polygon: Vec::new(),
            population: rng.random_range(5_000..80_000),
            median_income: rng.random_range(30_000.0..140_000.0),
            infra_age_index: rng.random_range(0.2..0.9),
            base_load_mw: rng.random_range(30.0..90.0),
            vulnerability: rng.random_range(0.1..0.9),
            heat_sensitivity: rng.random_range(0.3..0.9),
            flood_risk: rng.random_range(0.1..0.6),
        })
        .collect();

    let mut nodes = Vec::new();
    for z in &zone_list {
        for k in 0..rng.random_range(1..=3) {
            nodes.push(GridNode {
                id: format!("n-{}-{k}", z.id),
                label: format!("{} sub {k}", z.name),
                zone_id: z.id.clone(),
                capacity_mw: rng.random_range(40.0..160.0),
                critical: rng.random_bool(0.2),
                status: NodeStatus::Operational,
            });
        }
    }

    let mut edges = Vec::new();
    for pair in nodes.windows(2) {
        edges.push(GridEdge {
            id: format!("e-{}", edges.len()),
            from_node_id: pair[0].id.clone(),
            to_node_id: pair[1].id.clone(),
            max_flow_mw: rng.random_range(40.0..120.0),
            status: EdgeStatus::Operational,
        });
    }
    for extra in 0..nodes.len() / 2 {
        let a = rng.random_range(0..nodes.len());
        let b = rng.random_range(0..nodes.len());
        edges.push(GridEdge {
            id: format!("e-{}", edges.len()),
            from_node_id: nodes[a].id.clone(),
            to_node_id: nodes[b].id.clone(),
            max_flow_mw: 60.0,
            status: if extra == 0 {
                EdgeStatus::Failed
            } else {
                EdgeStatus::Operational
            },
        });
    }

    Catalog::new(zone_list, nodes, edges).expect("synthetic catalog is valid")
}
