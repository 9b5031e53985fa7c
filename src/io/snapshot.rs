//! Self-contained filing snapshots of a run.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compare::ComparisonDelta;
use crate::error::Result;
use crate::ids::timestamp_token;
use crate::plan::Plan;
use crate::scenario::Scenario;
use crate::sim::SimulationResult;

/// Version string stamped into every audit trail.
pub const TOOL_VERSION: &str = concat!("gridcase-", env!("CARGO_PKG_VERSION"));

/// Identifiers needed to reproduce and cross-reference a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub run_id: String,
    /// Exact seed used for the run.
    pub seed: u32,
    pub plan_id: String,
    pub scenario_id: String,
    pub tool_version: String,
}

/// Everything needed to review a run without the tool: inputs, outputs, an
/// optional comparison, and the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingSnapshot {
    pub snapshot_id: String,
    pub generated_at: DateTime<Utc>,
    pub plan: Plan,
    pub scenario: Scenario,
    pub result: SimulationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<ComparisonDelta>,
    pub audit_trail: AuditTrail,
}

/// Bundles a run into a snapshot. Performs no I/O.
pub fn export_snapshot(
    plan: &Plan,
    scenario: &Scenario,
    result: &SimulationResult,
    delta: Option<&ComparisonDelta>,
) -> FilingSnapshot {
    let now = Utc::now();
    FilingSnapshot {
        snapshot_id: format!("snap_{}_{}", timestamp_token(now), result.id),
        generated_at: now,
        plan: plan.clone(),
        scenario: scenario.clone(),
        result: result.clone(),
        delta: delta.cloned(),
        audit_trail: AuditTrail {
            run_id: result.id.clone(),
            seed: result.seed,
            plan_id: result.plan_id.clone(),
            scenario_id: result.scenario_id.clone(),
            tool_version: TOOL_VERSION.to_string(),
        },
    }
}

impl FilingSnapshot {
    /// Writes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_json(&self, writer: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Writes the snapshot to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut buf = io::BufWriter::new(File::create(path)?);
        self.write_json(&mut buf)?;
        buf.flush()?;
        Ok(())
    }

    /// Reads a snapshot back from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
