mod common;

use gridcase_sim::compare::DEAD_BAND_HOURS;
use gridcase_sim::io::{FilingSnapshot, export_snapshot};
use gridcase_sim::sim::Engine;
use gridcase_sim::sim::effects::is_shielded;
use gridcase_sim::sim::event::{EventKind, Severity};
use gridcase_sim::{compare_results, generate_run_id, run_simulation};

use common::{all_projects_plan, austin, empty_plan, plan_with};

#[test]
fn full_catalog_stabilizes_the_freeze() {
    let data = austin();
    let scenario = data.require_scenario("sc-freeze").expect("freeze");

    let empty = run_simulation(&data.catalog, &empty_plan(), scenario, 42).expect("empty run");
    let full_plan = all_projects_plan(&data);
    let full = run_simulation(&data.catalog, &full_plan, scenario, 42).expect("full run");

    assert_eq!(empty.id, generate_run_id("plan-empty", "sc-freeze", 42));
    assert_eq!(empty.node_status_history.len(), 15);
    for run in [&empty, &full] {
        assert!(run.node_status_history.values().all(|h| h.len() == 4320));
    }
    assert!(empty.metrics.stability_score < full.metrics.stability_score);
    assert!(
        empty
            .event_log
            .iter()
            .any(|e| e.kind == EventKind::OverloadWarning && e.severity == Severity::Warning)
    );
    assert!(empty.metrics.nodes_failed_count > 0);
    assert!(full.metrics.nodes_failed_count < empty.metrics.nodes_failed_count);

    let delta = compare_results(&empty, &full);
    assert!(delta.metric_deltas.stability_score > 0.0);
    assert!(delta.metric_deltas.total_outage_hours < 0);
    assert!(!delta.improved_zones.is_empty());
}

#[test]
fn shielded_nodes_never_fail() {
    let data = austin();
    let plan = all_projects_plan(&data);
    let scenario = data.require_scenario("sc-freeze").expect("freeze");
    let result = run_simulation(&data.catalog, &plan, scenario, 42).expect("run");

    let shielded: Vec<&str> = data
        .catalog
        .nodes()
        .iter()
        .filter(|n| is_shielded(&data.catalog, &plan, &n.id))
        .map(|n| n.id.as_str())
        .collect();
    assert!(!shielded.is_empty());

    for id in &shielded {
        assert!(
            result.node_status_history[*id].iter().all(|s| !s.is_failed()),
            "shielded node {id} failed"
        );
        assert!(!result.event_log.iter().any(|e| {
            e.node_id.as_deref() == Some(*id)
                && matches!(
                    e.kind,
                    EventKind::NodeFail | EventKind::CascadeFail | EventKind::FloodDamage
                )
        }));
    }
    assert!(
        result
            .event_log
            .iter()
            .any(|e| e.kind == EventKind::ZoneShielded)
    );
}

#[test]
fn engine_profiles_agree_with_resolver() {
    let data = austin();
    let plan = plan_with(&data, &["p-rundberg-storage", "p-east-smart"]);
    let scenario = data.require_scenario("sc-heat-dome").expect("heat");
    let engine = Engine::new(&data.catalog, &plan, scenario, 9).expect("engine");

    for (node, profile) in data.catalog.nodes().iter().zip(engine.profiles()) {
        assert_eq!(profile.shielded, is_shielded(&data.catalog, &plan, &node.id));
    }
    let via_engine = engine.run();
    let via_fn = run_simulation(&data.catalog, &plan, scenario, 9).expect("run");
    assert_eq!(via_engine.event_log, via_fn.event_log);
}

#[test]
fn running_does_not_touch_the_plan() {
    let data = austin();
    let plan = plan_with(&data, &["p-dt-upgrade", "p-west-cable"]);
    let before = plan.clone();
    let scenario = data.require_scenario("sc-ev-spike").expect("ev");

    run_simulation(&data.catalog, &plan, scenario, 77).expect("run");
    assert_eq!(plan, before);

    let project = data.project("p-dt-upgrade").expect("project");
    let again = plan.apply_project(project);
    assert_eq!(again, plan);
}

#[test]
fn comparison_signs_follow_zone_outages() {
    let data = austin();
    let scenario = data.require_scenario("sc-heat-dome").expect("heat");
    let base = run_simulation(&data.catalog, &empty_plan(), scenario, 5).expect("base");
    let alt = run_simulation(
        &data.catalog,
        &plan_with(&data, &["p-rundberg-storage", "p-mont-microgrid", "p-rund-hardening"]),
        scenario,
        5,
    )
    .expect("alt");

    let delta = compare_results(&base, &alt);
    for (zone, &d) in &delta.outage_by_zone_delta {
        assert_eq!(d, i64::from(alt.outage_by_zone[zone]) - i64::from(base.outage_by_zone[zone]));
        let improved = delta.improved_zones.contains(zone);
        let worsened = delta.worsened_zones.contains(zone);
        assert_eq!(improved, (d as f64) < -DEAD_BAND_HOURS);
        assert_eq!(worsened, (d as f64) > DEAD_BAND_HOURS);
    }

    let reverse = compare_results(&alt, &base);
    assert_eq!(reverse.improved_zones, delta.worsened_zones);
    assert_eq!(reverse.worsened_zones, delta.improved_zones);
    assert_eq!(
        reverse.metric_deltas.total_outage_hours,
        -delta.metric_deltas.total_outage_hours
    );
}

#[test]
fn snapshot_round_trips_through_a_file() {
    let data = austin();
    let plan = plan_with(&data, &["p-mont-battery"]);
    let scenario = data.require_scenario("sc-freeze").expect("freeze");
    let base = run_simulation(&data.catalog, &empty_plan(), scenario, u32::MAX).expect("base");
    let result = run_simulation(&data.catalog, &plan, scenario, u32::MAX).expect("run");
    let delta = compare_results(&base, &result);

    let snapshot = export_snapshot(&plan, scenario, &result, Some(&delta));
    let path = std::env::temp_dir().join(format!("gridcase-{}.json", snapshot.snapshot_id));
    snapshot.save(&path).expect("save");
    let loaded = FilingSnapshot::load(&path).expect("load");
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.audit_trail.seed, u32::MAX);
    assert_eq!(loaded.audit_trail.run_id, result.id);
    assert_eq!(loaded.delta.as_ref().map(|d| d.alt_result_id.as_str()), Some(result.id.as_str()));
}
