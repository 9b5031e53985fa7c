//! Regional grid resilience simulator.
//!
//! Runs hour-by-hour stress simulations of a substation network under a
//! hazard scenario, applies an investment plan's effects, and produces
//! reproducible results, comparisons, and filing snapshots.

#[cfg(feature = "api")]
pub mod api;
pub mod compare;
pub mod config;
pub mod error;
pub mod history;
pub mod ids;
/// CSV and JSON snapshot export.
pub mod io;
pub mod plan;
pub mod scenario;
/// Simulation engine, cascade, effects, and metrics modules.
pub mod sim;
pub mod topology;

pub use compare::{ComparisonDelta, compare_results};
pub use error::{Result, SimError};
pub use ids::generate_run_id;
pub use io::export_snapshot;
pub use plan::{Assumptions, Plan, Project, ProjectType, Role};
pub use scenario::{Hazard, Scenario};
pub use sim::{SimulationResult, run_simulation};
pub use topology::Catalog;
