//! TOML catalog and plan configuration, plus built-in presets.
//!
//! A catalog file carries the static topology, the project catalog, and the
//! scenarios:
//!
//! ```toml
//! [[zones]]
//! id = "z-east"
//! name = "East"
//! population = 52000
//! median_income = 41000
//! infra_age_index = 0.8
//! base_load_mw = 120
//! vulnerability = 0.7
//! heat_sensitivity = 0.6
//! flood_risk = 0.5
//!
//! [[nodes]]
//! id = "n-east"
//! label = "East Substation"
//! zone_id = "z-east"
//! capacity_mw = 160
//!
//! [[scenarios]]
//! id = "sc-freeze"
//! name = "Winter Freeze"
//! profile = "freeze-6mo"
//! ```
//!
//! A plan file names projects from the catalog:
//!
//! ```toml
//! [plan]
//! id = "plan-east"
//! name = "East hardening"
//! role = "regulator"
//! projects = ["p-east-battery"]
//!
//! [assumptions]
//! ev_adoption_rate = 0.4
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::error::{Result, SimError};
use crate::plan::{Assumptions, Plan, Project, Role};
use crate::scenario::{CurveProfile, Hazard, SIX_MONTHS_HOURS, Scenario};
use crate::topology::{Catalog, GridEdge, GridNode, Zone};

const AUSTIN_TOML: &str = include_str!("../data/austin.toml");

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"nodes[3].zone_id"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Scenario entry: either a built-in `profile` or explicit curves.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to 4320 for profiles, or the curve length otherwise.
    pub duration_hours: Option<usize>,
    /// Defaults to the profile's hazard. Required with explicit curves.
    pub hazard: Option<Hazard>,
    pub profile: Option<CurveProfile>,
    #[serde(default)]
    pub demand_curve: Vec<f64>,
    #[serde(default)]
    pub weather_stress_curve: Vec<f64>,
}

impl ScenarioConfig {
    fn validate_into(&self, path: &str, errors: &mut Vec<ConfigError>) {
        let explicit = !self.demand_curve.is_empty() || !self.weather_stress_curve.is_empty();
        match self.profile {
            Some(_) if explicit => errors.push(ConfigError::new(
                path,
                "give either `profile` or explicit curves, not both",
            )),
            Some(_) => {}
            None => {
                if self.hazard.is_none() {
                    errors.push(ConfigError::new(
                        format!("{path}.hazard"),
                        "required when no `profile` is given",
                    ));
                }
                if let Err(err) = self.build().and_then(|s| s.validate()) {
                    errors.push(ConfigError::new(path, err.to_string()));
                }
            }
        }
        if self.duration_hours == Some(0) {
            errors.push(ConfigError::new(format!("{path}.duration_hours"), "must be > 0"));
        }
    }

    /// Materializes the scenario curves.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidScenario`] if explicit curves are given
    /// without a hazard.
    pub fn build(&self) -> Result<Scenario> {
        if let Some(profile) = self.profile {
            let mut scenario = Scenario::from_profile(
                self.id.clone(),
                self.name.clone(),
                self.description.clone(),
                profile,
                self.duration_hours.unwrap_or(SIX_MONTHS_HOURS),
            );
            if let Some(hazard) = self.hazard {
                scenario.hazard = hazard;
            }
            return Ok(scenario);
        }
        let hazard = self.hazard.ok_or_else(|| SimError::InvalidScenario {
            scenario_id: self.id.clone(),
            reason: "explicit curves need a hazard".to_string(),
        })?;
        Ok(Scenario {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            duration_hours: self.duration_hours.unwrap_or(self.demand_curve.len()),
            hazard,
            demand_curve: self.demand_curve.clone(),
            weather_stress_curve: self.weather_stress_curve.clone(),
        })
    }
}

/// Top-level catalog file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub zones: Vec<Zone>,
    pub nodes: Vec<GridNode>,
    pub edges: Vec<GridEdge>,
    pub projects: Vec<Project>,
    pub scenarios: Vec<ScenarioConfig>,
}

/// Validated, ready-to-simulate inputs.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub catalog: Catalog,
    pub projects: Vec<Project>,
    pub scenarios: Vec<Scenario>,
}

impl Dataset {
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Looks up a scenario by id.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownScenario`] if no scenario has this id.
    pub fn require_scenario(&self, id: &str) -> Result<&Scenario> {
        self.scenario(id)
            .ok_or_else(|| SimError::UnknownScenario(id.to_string()))
    }

    /// Resolves project ids against the catalog, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownProject`] for the first unresolved id.
    pub fn resolve_projects<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Project>> {
        ids.iter()
            .map(|id| {
                let id = id.as_ref();
                self.project(id)
                    .cloned()
                    .ok_or_else(|| SimError::UnknownProject(id.to_string()))
            })
            .collect()
    }
}

fn check_unit(errors: &mut Vec<ConfigError>, field: String, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigError::new(field, format!("must be within [0, 1], got {value}")));
    }
}

fn check_non_negative(errors: &mut Vec<ConfigError>, field: String, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ConfigError::new(field, format!("must be >= 0, got {value}")));
    }
}

fn check_unique<'a>(
    errors: &mut Vec<ConfigError>,
    section: &str,
    ids: impl Iterator<Item = &'a str>,
) {
    let mut seen = HashSet::new();
    for (i, id) in ids.enumerate() {
        if !seen.insert(id) {
            errors.push(ConfigError::new(
                format!("{section}[{i}].id"),
                format!("duplicate id \"{id}\""),
            ));
        }
    }
}

impl CatalogConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["austin"];

    /// Austin, Texas: 15 zones, 15 substations, 21 links, 24 candidate
    /// projects, and the freeze, heat dome, and EV surge scenarios.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the embedded data fails to parse.
    pub fn austin() -> std::result::Result<Self, ConfigError> {
        Self::from_toml_str(AUSTIN_TOML)
    }

    /// Loads a catalog from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> std::result::Result<Self, ConfigError> {
        match name {
            "austin" => Self::austin(),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("catalog", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a catalog from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.zones.is_empty() {
            errors.push(ConfigError::new("zones", "at least one zone is required"));
        }
        if self.nodes.is_empty() {
            errors.push(ConfigError::new("nodes", "at least one node is required"));
        }

        check_unique(&mut errors, "zones", self.zones.iter().map(|z| z.id.as_str()));
        check_unique(&mut errors, "nodes", self.nodes.iter().map(|n| n.id.as_str()));
        check_unique(&mut errors, "edges", self.edges.iter().map(|e| e.id.as_str()));
        check_unique(&mut errors, "projects", self.projects.iter().map(|p| p.id.as_str()));
        check_unique(&mut errors, "scenarios", self.scenarios.iter().map(|s| s.id.as_str()));

        let zone_ids: HashSet<&str> = self.zones.iter().map(|z| z.id.as_str()).collect();
        let node_ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();

        for (i, z) in self.zones.iter().enumerate() {
            let f = |name: &str| format!("zones[{i}].{name}");
            check_unit(&mut errors, f("infra_age_index"), z.infra_age_index);
            check_unit(&mut errors, f("vulnerability"), z.vulnerability);
            check_unit(&mut errors, f("heat_sensitivity"), z.heat_sensitivity);
            check_unit(&mut errors, f("flood_risk"), z.flood_risk);
            check_non_negative(&mut errors, f("base_load_mw"), z.base_load_mw);
            if !(z.median_income.is_finite() && z.median_income > 0.0) {
                errors.push(ConfigError::new(f("median_income"), "must be > 0"));
            }
        }

        for (i, n) in self.nodes.iter().enumerate() {
            if !zone_ids.contains(n.zone_id.as_str()) {
                errors.push(ConfigError::new(
                    format!("nodes[{i}].zone_id"),
                    format!("unknown zone \"{}\"", n.zone_id),
                ));
            }
            if !(n.capacity_mw.is_finite() && n.capacity_mw > 0.0) {
                errors.push(ConfigError::new(format!("nodes[{i}].capacity_mw"), "must be > 0"));
            }
        }

        for (i, e) in self.edges.iter().enumerate() {
            for (end, id) in [("from_node_id", &e.from_node_id), ("to_node_id", &e.to_node_id)] {
                if !node_ids.contains(id.as_str()) {
                    errors.push(ConfigError::new(
                        format!("edges[{i}].{end}"),
                        format!("unknown node \"{id}\""),
                    ));
                }
            }
            check_non_negative(&mut errors, format!("edges[{i}].max_flow_mw"), e.max_flow_mw);
        }

        for (i, p) in self.projects.iter().enumerate() {
            if !zone_ids.contains(p.zone_id.as_str()) {
                errors.push(ConfigError::new(
                    format!("projects[{i}].zone_id"),
                    format!("unknown zone \"{}\"", p.zone_id),
                ));
            }
            if let Some(node) = p.node_id.as_ref().filter(|n| !node_ids.contains(n.as_str())) {
                errors.push(ConfigError::new(
                    format!("projects[{i}].node_id"),
                    format!("unknown node \"{node}\""),
                ));
            }
            check_non_negative(&mut errors, format!("projects[{i}].capex_usd"), p.capex_usd);
        }

        for (i, s) in self.scenarios.iter().enumerate() {
            s.validate_into(&format!("scenarios[{i}]"), &mut errors);
        }

        errors
    }

    /// Validates and assembles the dataset.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, after logging all of them.
    pub fn build(&self) -> Result<Dataset> {
        let errors = self.validate();
        for e in &errors {
            warn!(field = %e.field, "{}", e.message);
        }
        if let Some(first) = errors.into_iter().next() {
            return Err(first.into());
        }

        let catalog = Catalog::new(self.zones.clone(), self.nodes.clone(), self.edges.clone())?;
        let scenarios = self
            .scenarios
            .iter()
            .map(|s| {
                let scenario = s.build()?;
                scenario.validate()?;
                Ok(scenario)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Dataset {
            catalog,
            projects: self.projects.clone(),
            scenarios,
        })
    }
}

/// `[plan]` section of a plan file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanSection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub projects: Vec<String>,
}

/// Per-field overrides applied on top of the role's preset assumptions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssumptionOverrides {
    pub ev_adoption_rate: Option<f64>,
    pub population_growth_rate: Option<f64>,
    pub renewable_target: Option<f64>,
    pub budget_cap_usd: Option<f64>,
}

impl AssumptionOverrides {
    pub fn apply(&self, base: Assumptions) -> Assumptions {
        Assumptions {
            ev_adoption_rate: self.ev_adoption_rate.unwrap_or(base.ev_adoption_rate),
            population_growth_rate: self
                .population_growth_rate
                .unwrap_or(base.population_growth_rate),
            renewable_target: self.renewable_target.unwrap_or(base.renewable_target),
            budget_cap_usd: self.budget_cap_usd.unwrap_or(base.budget_cap_usd),
        }
    }
}

/// Top-level plan file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    pub plan: PlanSection,
    #[serde(default)]
    pub assumptions: AssumptionOverrides,
}

impl PlanConfig {
    /// Parses a plan from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("plan", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a plan from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Effective assumptions: role preset with file overrides applied.
    pub fn assumptions(&self) -> Assumptions {
        self.assumptions.apply(Assumptions::for_role(self.plan.role))
    }

    /// Validates the plan against a dataset.
    pub fn validate(&self, dataset: &Dataset) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for (i, id) in self.plan.projects.iter().enumerate() {
            if dataset.project(id).is_none() {
                errors.push(ConfigError::new(
                    format!("plan.projects[{i}]"),
                    format!("unknown project \"{id}\""),
                ));
            }
            if !seen.insert(id.as_str()) {
                errors.push(ConfigError::new(
                    format!("plan.projects[{i}]"),
                    format!("duplicate project \"{id}\""),
                ));
            }
        }
        let a = self.assumptions();
        check_unit(&mut errors, "assumptions.ev_adoption_rate".into(), a.ev_adoption_rate);
        check_unit(&mut errors, "assumptions.renewable_target".into(), a.renewable_target);
        check_non_negative(&mut errors, "assumptions.budget_cap_usd".into(), a.budget_cap_usd);
        if !a.population_growth_rate.is_finite() || a.population_growth_rate <= -100.0 {
            errors.push(ConfigError::new(
                "assumptions.population_growth_rate",
                "must be a finite percentage above -100",
            ));
        }
        errors
    }

    /// Resolves the plan against a dataset.
    ///
    /// # Errors
    ///
    /// Returns the first validation error.
    pub fn build(&self, dataset: &Dataset) -> Result<Plan> {
        if let Some(first) = self.validate(dataset).into_iter().next() {
            return Err(first.into());
        }
        let projects = dataset.resolve_projects(&self.plan.projects)?;
        Plan::from_parts(
            self.plan.id.clone(),
            self.plan.name.clone(),
            self.plan.role,
            projects,
            self.assumptions(),
        )
    }
}
