//! Error types shared across the engine, configuration, and export layers.

use thiserror::Error;

use crate::config::ConfigError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;

/// Everything that can go wrong outside the hourly loop itself.
///
/// The loop never fails once a run has started: catalog misses fall back to
/// conservative defaults. These variants cover structurally invalid inputs
/// rejected up front and the I/O performed by exporters.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("scenario `{scenario_id}` is invalid: {reason}")]
    InvalidScenario { scenario_id: String, reason: String },

    #[error("catalog contains no {0}")]
    EmptyCatalog(&'static str),

    #[error("unknown zone `{0}`")]
    UnknownZone(String),

    #[error("unknown node `{0}`")]
    UnknownNode(String),

    #[error("unknown project `{0}`")]
    UnknownProject(String),

    #[error("unknown scenario `{0}`")]
    UnknownScenario(String),

    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },

    #[error("generated project rejected: {0}")]
    GeneratedProject(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
