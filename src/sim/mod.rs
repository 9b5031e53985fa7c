/// Breadth-first cascade propagation.
pub mod cascade;
/// Hour cursor over a scenario.
pub mod clock;
pub mod effects;
pub mod engine;
/// Event log entries.
pub mod event;
pub mod metrics;
pub mod rng;
pub mod types;

pub use engine::{Engine, run_simulation};
pub use types::SimulationResult;
