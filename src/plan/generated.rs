//! Intake for externally generated project proposals.
//!
//! An assistant classifies a free-text project description and proposes an
//! effect bundle. Its reply is treated strictly as data: the JSON object is
//! pulled out of any surrounding prose, unknown types collapse to
//! [`ProjectType::Custom`], and every effect is clamped before it can reach
//! a [`Project`].

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use super::{EffectBundle, MAX_CAPACITY_BOOST_MW, Project, ProjectType};
use crate::error::{Result, SimError};
use crate::ids::timestamp_token;
use crate::topology::Catalog;

/// Classified proposal extracted from an assistant reply.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProject {
    pub project_type: ProjectType,
    pub effects: EffectBundle,
    pub refined_description: String,
}

/// Caller-supplied details that accompany a generated proposal.
#[derive(Debug, Clone)]
pub struct ProjectRequest {
    pub name: String,
    pub description: String,
    pub zone_id: String,
    /// Budget in millions of USD.
    pub budget_musd: f64,
}

impl GeneratedProject {
    /// Parses an assistant reply.
    ///
    /// The reply may wrap the object in markdown or prose; everything from
    /// the first `{` to the last `}` is parsed. A missing or empty
    /// `refinedDescription` falls back to `fallback_description`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::GeneratedProject`] if no JSON object can be found
    /// and [`SimError::Json`] if the object does not parse.
    pub fn from_reply(reply: &str, fallback_description: &str) -> Result<Self> {
        let start = reply.find('{');
        let end = reply.rfind('}');
        let object = match (start, end) {
            (Some(s), Some(e)) if s < e => &reply[s..=e],
            _ => {
                warn!("assistant reply contained no JSON object");
                return Err(SimError::GeneratedProject(
                    "no JSON object in reply".to_string(),
                ));
            }
        };

        let parsed: Value = serde_json::from_str(object)?;

        let project_type = parsed
            .get("type")
            .and_then(Value::as_str)
            .and_then(|t| t.parse().ok())
            .unwrap_or(ProjectType::Custom);

        let effects = parsed.get("effects");
        let field = |key: &str, hi: f64| -> Option<f64> {
            let v = effects.and_then(|e| e.get(key)).and_then(numeric)?;
            // Zero means "not provided".
            (v != 0.0 && v.is_finite()).then(|| v.clamp(0.0, hi))
        };
        let effects = EffectBundle {
            capacity_boost_mw: field("capacityBoostMW", MAX_CAPACITY_BOOST_MW),
            vulnerability_reduction: field("vulnerabilityReduction", 1.0),
            demand_reduction_factor: field("demandReductionFactor", 1.0),
            cascade_resistance: field("cascadeResistance", 1.0),
            recovery_speed_boost: field("recoverySpeedBoost", 1.0),
            utility_resilience_boost: field("utilityResilienceBoost", 1.0),
        };

        let refined_description = parsed
            .get("refinedDescription")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback_description)
            .to_string();

        Ok(Self {
            project_type,
            effects,
            refined_description,
        })
    }

    /// Turns the proposal into a catalog-ready project for the requested zone.
    ///
    /// The id is derived from the current time (`p-ai-<base36 millis>`) and
    /// capex is the requested budget in USD.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownZone`] if the zone is not in the catalog.
    pub fn into_project(self, catalog: &Catalog, request: &ProjectRequest) -> Result<Project> {
        if catalog.zone(&request.zone_id).is_none() {
            return Err(SimError::UnknownZone(request.zone_id.clone()));
        }
        Ok(Project {
            id: format!("p-ai-{}", timestamp_token(Utc::now())),
            name: request.name.clone(),
            project_type: self.project_type,
            zone_id: request.zone_id.clone(),
            node_id: None,
            capex_usd: request.budget_musd.max(0.0) * 1_000_000.0,
            effects: self.effects,
            description: self.refined_description,
        })
    }
}

/// Numbers, or strings holding numbers.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
