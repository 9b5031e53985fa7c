//! Read-only REST API over a completed run.
//!
//! Provides three GET endpoints:
//! - `/summary`: run identity, metrics, and the baseline comparison if any
//! - `/events`: the event log, optionally cut at an hour or severity
//! - `/outages`: outage hours per zone

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::compare::ComparisonDelta;
use crate::plan::Plan;
use crate::scenario::Scenario;
use crate::sim::SimulationResult;

pub use types::{ErrorResponse, EventsQuery, SummaryResponse, ZoneOutage};

/// Immutable application state shared across all request handlers.
///
/// Built once after the run completes and wrapped in `Arc`; nothing is
/// mutated afterwards.
pub struct AppState {
    pub plan: Plan,
    pub scenario: Scenario,
    pub result: SimulationResult,
    /// Comparison against the baseline run, when one was requested.
    pub delta: Option<ComparisonDelta>,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/events", get(handlers::get_events))
        .route("/outages", get(handlers::get_outages))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process ends.
///
/// # Errors
///
/// Returns an error if the listener cannot bind to `addr` or the server
/// fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
