//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::compare::ComparisonDelta;
use crate::sim::event::Severity;
use crate::sim::metrics::RunMetrics;

use super::AppState;

/// Run identity, headline metrics, and the optional baseline comparison.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub run_id: String,
    pub plan_id: String,
    pub plan_name: String,
    pub scenario_id: String,
    pub scenario_name: String,
    pub seed: u32,
    pub duration_hours: usize,
    pub project_count: usize,
    pub total_capex_usd: f64,
    pub metrics: RunMetrics,
    pub event_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<ComparisonDelta>,
}

impl From<&AppState> for SummaryResponse {
    fn from(s: &AppState) -> Self {
        Self {
            run_id: s.result.id.clone(),
            plan_id: s.plan.id().to_string(),
            plan_name: s.plan.name().to_string(),
            scenario_id: s.scenario.id.clone(),
            scenario_name: s.scenario.name.clone(),
            seed: s.result.seed,
            duration_hours: s.scenario.duration_hours,
            project_count: s.plan.projects().len(),
            total_capex_usd: s.plan.total_capex_usd(),
            metrics: s.result.metrics.clone(),
            event_count: s.result.event_log.len(),
            delta: s.delta.clone(),
        }
    }
}

/// One row of the outage table.
#[derive(Debug, Serialize)]
pub struct ZoneOutage {
    pub zone_id: String,
    pub outage_hours: u32,
}

/// Optional filters for the events endpoint.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// First hour to include.
    pub from: Option<usize>,
    /// Last hour to include (inclusive).
    pub until: Option<usize>,
    /// Minimum severity to include.
    pub severity: Option<Severity>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
