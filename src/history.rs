//! In-memory, append-only record of completed runs.

use serde::Serialize;
use tracing::{info, warn};

use crate::compare::ComparisonDelta;
use crate::error::Result;
use crate::plan::Plan;
use crate::scenario::Scenario;
use crate::sim::{SimulationResult, run_simulation};
use crate::topology::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Done,
    Error,
}

/// Completed runs in submission order, plus an optional baseline.
///
/// Mutation goes through `&mut self`, so at most one run can be in flight
/// per history.
#[derive(Debug, Default)]
pub struct RunHistory {
    runs: Vec<SimulationResult>,
    status: RunStatus,
    baseline: Option<usize>,
    last_error: Option<String>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a simulation and appends its result.
    ///
    /// On failure the history is left unchanged apart from the status, which
    /// becomes [`RunStatus::Error`].
    ///
    /// # Errors
    ///
    /// Propagates any error from [`run_simulation`].
    pub fn run(
        &mut self,
        catalog: &Catalog,
        plan: &Plan,
        scenario: &Scenario,
        seed: u32,
    ) -> Result<&SimulationResult> {
        self.status = RunStatus::Running;
        match run_simulation(catalog, plan, scenario, seed) {
            Ok(result) => {
                info!(run = %result.id, stability = result.metrics.stability_score, "run recorded");
                self.status = RunStatus::Done;
                self.last_error = None;
                self.runs.push(result);
                Ok(&self.runs[self.runs.len() - 1])
            }
            Err(err) => {
                warn!(error = %err, "run failed");
                self.status = RunStatus::Error;
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn results(&self) -> &[SimulationResult] {
        &self.runs
    }

    pub fn latest(&self) -> Option<&SimulationResult> {
        self.runs.last()
    }

    pub fn get(&self, run_id: &str) -> Option<&SimulationResult> {
        self.runs.iter().rev().find(|r| r.id == run_id)
    }

    /// Marks the most recent run as the baseline. Returns `false` if the
    /// history is empty.
    pub fn lock_baseline(&mut self) -> bool {
        self.baseline = self.runs.len().checked_sub(1);
        self.baseline.is_some()
    }

    /// Marks the most recent run with the given id as the baseline. Returns
    /// `false`, leaving the baseline unchanged, if no run matches.
    pub fn set_baseline(&mut self, run_id: &str) -> bool {
        match self.runs.iter().rposition(|r| r.id == run_id) {
            Some(i) => {
                self.baseline = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn clear_baseline(&mut self) {
        self.baseline = None;
    }

    pub fn baseline(&self) -> Option<&SimulationResult> {
        self.baseline.and_then(|i| self.runs.get(i))
    }

    /// Latest run compared against the baseline, when both exist.
    pub fn compare_to_baseline(&self) -> Option<ComparisonDelta> {
        Some(ComparisonDelta::between(self.baseline()?, self.latest()?))
    }
}
