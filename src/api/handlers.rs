//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, EventsQuery, SummaryResponse, ZoneOutage};
use crate::sim::event::EventLogEntry;

/// `GET /summary` → 200 + `SummaryResponse` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    Json(SummaryResponse::from(state.as_ref()))
}

/// Returns event log entries, optionally filtered.
///
/// `GET /events` → 200 + `Vec<EventLogEntry>` JSON
/// `GET /events?until=N` → entries with `timestep <= N`
/// `GET /events?from=N&until=M&severity=critical` → combined filters
/// `GET /events?from=10&until=5` → 400 + `ErrorResponse`
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let until = query.until.unwrap_or(usize::MAX);

    if from > until {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `until` ({until})"),
            }),
        ));
    }

    let entries: Vec<EventLogEntry> = state
        .result
        .event_log
        .iter()
        .filter(|e| (from..=until).contains(&e.timestep))
        .filter(|e| query.severity.is_none_or(|min| e.severity >= min))
        .cloned()
        .collect();

    Ok(Json(entries))
}

/// `GET /outages` → 200 + `Vec<ZoneOutage>` JSON in catalog order
pub async fn get_outages(State(state): State<Arc<AppState>>) -> Json<Vec<ZoneOutage>> {
    Json(
        state
            .result
            .outage_by_zone
            .iter()
            .map(|(zone_id, &outage_hours)| ZoneOutage {
                zone_id: zone_id.clone(),
                outage_hours,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::plan::{Assumptions, Plan, Role};
    use crate::scenario::{CurveProfile, Scenario};
    use crate::sim::run_simulation;
    use crate::topology::{Catalog, GridEdge, GridNode, NodeStatus, Zone};

    fn zone(id: &str, income: f64) -> Zone {
        Zone {
            id: id.into(),
            name: id.into(),
            polygon: Vec::new(),
            population: 1000,
            median_income: income,
            infra_age_index: 0.8,
            base_load_mw: 80.0,
            vulnerability: 0.7,
            heat_sensitivity: 0.5,
            flood_risk: 0.5,
        }
    }

    fn node(id: &str, zone_id: &str) -> GridNode {
        GridNode {
            id: id.into(),
            label: id.into(),
            zone_id: zone_id.into(),
            capacity_mw: 85.0,
            critical: false,
            status: NodeStatus::Operational,
        }
    }

    fn make_test_state() -> Arc<AppState> {
        let catalog = Catalog::new(
            vec![zone("z-a", 40_000.0), zone("z-b", 90_000.0)],
            vec![node("n-a", "z-a"), node("n-b", "z-b")],
            vec![GridEdge {
                id: "e".into(),
                from_node_id: "n-a".into(),
                to_node_id: "n-b".into(),
                max_flow_mw: 50.0,
                status: Default::default(),
            }],
        )
        .expect("catalog");
        let plan = Plan::new("p", "Plan", Role::Regulator, Assumptions::for_role(Role::Regulator));
        let scenario = Scenario::from_profile("s", "Freeze", "", CurveProfile::Freeze6mo, 240);
        let result = run_simulation(&catalog, &plan, &scenario, 42).expect("run");
        Arc::new(AppState {
            plan,
            scenario,
            result,
            delta: None,
        })
    }

    async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = router(state).oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn summary_returns_200() {
        let state = make_test_state();
        let (status, json) = get_json(state.clone(), "/summary").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["run_id"], state.result.id.as_str());
        assert_eq!(json["seed"], 42);
        assert_eq!(json["duration_hours"], 240);
        assert!(json["metrics"].get("stability_score").is_some());
        assert!(json.get("delta").is_none());
    }

    #[tokio::test]
    async fn events_returns_full_log() {
        let state = make_test_state();
        let (status, json) = get_json(state.clone(), "/events").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json.as_array().map(Vec::len),
            Some(state.result.event_log.len())
        );
    }

    #[tokio::test]
    async fn events_until_cuts_the_log() {
        let state = make_test_state();
        let (status, json) = get_json(state.clone(), "/events?until=23").await;

        assert_eq!(status, StatusCode::OK);
        let expected = state
            .result
            .event_log
            .iter()
            .filter(|e| e.timestep <= 23)
            .count();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), expected);
        assert!(entries.iter().all(|e| e["timestep"].as_u64().unwrap() <= 23));
    }

    #[tokio::test]
    async fn events_severity_filter() {
        let state = make_test_state();
        let (_, json) = get_json(state, "/events?severity=critical").await;
        assert!(
            json.as_array()
                .unwrap()
                .iter()
                .all(|e| e["severity"] == "critical")
        );
    }

    #[tokio::test]
    async fn events_invalid_range_returns_400() {
        let state = make_test_state();
        let (status, json) = get_json(state, "/events?from=10&until=5").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn outages_in_catalog_order() {
        let state = make_test_state();
        let (status, json) = get_json(state, "/outages").await;

        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["zone_id"], "z-a");
        assert_eq!(rows[1]["zone_id"], "z-b");
    }
}
