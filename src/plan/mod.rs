//! Investment plans: projects, effect bundles, roles, and policy assumptions.
//!
//! A [`Plan`] is a value. Every edit (adding or removing a project, changing
//! an assumption) returns a new plan and leaves the receiver untouched.

pub mod generated;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::ids::timestamp_token;

/// Closed set of project categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    SubstationUpgrade,
    SolarFarm,
    BatteryStorage,
    GridHardening,
    EvCharging,
    UndergroundCable,
    SmartMeter,
    TransmissionUpgrade,
    CommunityMicrogrid,
    SolarStorage,
    WaterInfrastructure,
    DistrictHvac,
    EmergencyServices,
    Custom,
}

impl ProjectType {
    pub const ALL: [ProjectType; 14] = [
        Self::SubstationUpgrade,
        Self::SolarFarm,
        Self::BatteryStorage,
        Self::GridHardening,
        Self::EvCharging,
        Self::UndergroundCable,
        Self::SmartMeter,
        Self::TransmissionUpgrade,
        Self::CommunityMicrogrid,
        Self::SolarStorage,
        Self::WaterInfrastructure,
        Self::DistrictHvac,
        Self::EmergencyServices,
        Self::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SubstationUpgrade => "substation_upgrade",
            Self::SolarFarm => "solar_farm",
            Self::BatteryStorage => "battery_storage",
            Self::GridHardening => "grid_hardening",
            Self::EvCharging => "ev_charging",
            Self::UndergroundCable => "underground_cable",
            Self::SmartMeter => "smart_meter",
            Self::TransmissionUpgrade => "transmission_upgrade",
            Self::CommunityMicrogrid => "community_microgrid",
            Self::SolarStorage => "solar_storage",
            Self::WaterInfrastructure => "water_infrastructure",
            Self::DistrictHvac => "district_hvac",
            Self::EmergencyServices => "emergency_services",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown project type \"{s}\""))
    }
}

/// Upper bound on `capacity_boost_mw` as seen by the engine.
pub const MAX_CAPACITY_BOOST_MW: f64 = 100.0;

/// Optional simulation effects of a project.
///
/// Fields are stored as supplied. The accessor methods clamp on every read
/// (capacity boost to `[0, 100]` MW, everything else to `[0, 1]`) and treat
/// absent or non-finite values as zero, so the engine never sees an
/// out-of-domain effect regardless of who produced the bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_boost_mw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vulnerability_reduction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_reduction_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade_resistance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_speed_boost: Option<f64>,
    /// Delays water and HVAC degradation during outages. Not read by the
    /// failure model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utility_resilience_boost: Option<f64>,
}

fn bounded(value: Option<f64>, hi: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, hi),
        _ => 0.0,
    }
}

impl EffectBundle {
    pub fn capacity_boost_mw(&self) -> f64 {
        bounded(self.capacity_boost_mw, MAX_CAPACITY_BOOST_MW)
    }

    pub fn vulnerability_reduction(&self) -> f64 {
        bounded(self.vulnerability_reduction, 1.0)
    }

    pub fn demand_reduction_factor(&self) -> f64 {
        bounded(self.demand_reduction_factor, 1.0)
    }

    pub fn cascade_resistance(&self) -> f64 {
        bounded(self.cascade_resistance, 1.0)
    }

    pub fn recovery_speed_boost(&self) -> f64 {
        bounded(self.recovery_speed_boost, 1.0)
    }

    pub fn utility_resilience_boost(&self) -> f64 {
        bounded(self.utility_resilience_boost, 1.0)
    }

    /// Copy with every present field clamped and zero-valued fields dropped.
    pub fn clamped(&self) -> Self {
        let keep = |v: f64| (v > 0.0).then_some(v);
        Self {
            capacity_boost_mw: keep(self.capacity_boost_mw()),
            vulnerability_reduction: keep(self.vulnerability_reduction()),
            demand_reduction_factor: keep(self.demand_reduction_factor()),
            cascade_resistance: keep(self.cascade_resistance()),
            recovery_speed_boost: keep(self.recovery_speed_boost()),
            utility_resilience_boost: keep(self.utility_resilience_boost()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clamped() == Self::default()
    }
}

/// A capital investment targeting a zone, and optionally one node in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub zone_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub capex_usd: f64,
    #[serde(default)]
    pub effects: EffectBundle,
    #[serde(default)]
    pub description: String,
}

impl Project {
    /// Whether this project's node-level effects apply to the given node.
    pub fn targets_node(&self, node_id: &str, node_zone_id: &str) -> bool {
        self.node_id.as_deref() == Some(node_id) || self.zone_id == node_zone_id
    }

    /// Whether this project's zone-level effects apply to the given zone.
    pub fn targets_zone(&self, zone_id: &str) -> bool {
        self.zone_id == zone_id
    }
}

/// Stakeholder perspective a plan is authored from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    UtilityPlanner,
    Regulator,
    Advocate,
}

impl Role {
    pub const ALL: [Role; 3] = [Self::UtilityPlanner, Self::Regulator, Self::Advocate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UtilityPlanner => "utility_planner",
            Self::Regulator => "regulator",
            Self::Advocate => "advocate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UtilityPlanner => "utility planner",
            Self::Regulator => "regulator",
            Self::Advocate => "advocate",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown role \"{s}\", available: utility_planner, regulator, advocate"
                )
            })
    }
}

/// Policy inputs that scale load and bound spending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Assumptions {
    /// Fraction of vehicles electrified (0 to 1).
    pub ev_adoption_rate: f64,
    /// Annual population growth, in percent.
    pub population_growth_rate: f64,
    /// Renewable share of generation (0 to 1). Informational.
    pub renewable_target: f64,
    pub budget_cap_usd: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::for_role(Role::UtilityPlanner)
    }
}

impl Assumptions {
    /// Default assumptions each role starts from.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::UtilityPlanner => Self {
                ev_adoption_rate: 0.15,
                population_growth_rate: 3.2,
                renewable_target: 0.30,
                budget_cap_usd: 150_000_000.0,
            },
            Role::Regulator => Self {
                ev_adoption_rate: 0.35,
                population_growth_rate: 4.0,
                renewable_target: 0.50,
                budget_cap_usd: 200_000_000.0,
            },
            Role::Advocate => Self {
                ev_adoption_rate: 0.25,
                population_growth_rate: 3.5,
                renewable_target: 0.60,
                budget_cap_usd: 250_000_000.0,
            },
        }
    }
}

/// Serialized shape of a [`Plan`]; deserialization routes through
/// [`Plan::try_from`] to enforce unique project ids.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanRecord {
    id: String,
    name: String,
    role: Role,
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    assumptions: Assumptions,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

/// One planning alternative: an ordered set of unique projects plus
/// assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlanRecord")]
pub struct Plan {
    id: String,
    name: String,
    role: Role,
    projects: Vec<Project>,
    assumptions: Assumptions,
    created_at: DateTime<Utc>,
}

impl TryFrom<PlanRecord> for Plan {
    type Error = SimError;

    fn try_from(record: PlanRecord) -> Result<Self> {
        let mut plan = Self::from_parts(
            record.id,
            record.name,
            record.role,
            record.projects,
            record.assumptions,
        )?;
        plan.created_at = record.created_at;
        Ok(plan)
    }
}

impl Plan {
    /// Creates an empty plan.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        assumptions: Assumptions,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            projects: Vec::new(),
            assumptions,
            created_at: Utc::now(),
        }
    }

    /// Creates a plan with an initial project list.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DuplicateId`] if two projects share an id.
    pub fn from_parts(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        projects: Vec<Project>,
        assumptions: Assumptions,
    ) -> Result<Self> {
        for (i, p) in projects.iter().enumerate() {
            if projects[..i].iter().any(|q| q.id == p.id) {
                return Err(SimError::DuplicateId {
                    kind: "project",
                    id: p.id.clone(),
                });
            }
        }
        let mut plan = Self::new(id, name, role, assumptions);
        plan.projects = projects;
        Ok(plan)
    }

    /// Fresh, empty plan with the role's default assumptions and a
    /// timestamp-derived id.
    pub fn initial(role: Role) -> Self {
        let now = Utc::now();
        let mut plan = Self::new(
            format!("plan_{}_{}", role.as_str(), timestamp_token(now)),
            format!("{} base plan", role.label()),
            role,
            Assumptions::for_role(role),
        );
        plan.created_at = now;
        plan
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn contains(&self, project_id: &str) -> bool {
        self.projects.iter().any(|p| p.id == project_id)
    }

    /// Returns a plan with `project` appended and the id extended to
    /// `{id}-p{project_id}`.
    ///
    /// Idempotent: if a project with the same id is already present the
    /// result equals `self`.
    pub fn apply_project(&self, project: &Project) -> Self {
        if self.contains(&project.id) {
            return self.clone();
        }
        let mut next = self.clone();
        next.id = format!("{}-p{}", self.id, project.id);
        next.projects.push(project.clone());
        next.created_at = Utc::now();
        next
    }

    /// Returns a plan without the given project, stripping the first
    /// `-p{project_id}` segment from the id. Absent ids yield an unchanged
    /// copy.
    pub fn remove_project(&self, project_id: &str) -> Self {
        if !self.contains(project_id) {
            return self.clone();
        }
        let mut next = self.clone();
        next.id = self.id.replacen(&format!("-p{project_id}"), "", 1);
        next.projects.retain(|p| p.id != project_id);
        next.created_at = Utc::now();
        next
    }

    /// Returns a copy under a different id.
    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }

    /// Returns a plan with the assumptions replaced.
    pub fn with_assumptions(&self, assumptions: Assumptions) -> Self {
        Self {
            assumptions,
            created_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Returns a plan with one or more assumptions edited in place.
    ///
    /// ```
    /// use gridcase_sim::plan::{Plan, Role};
    ///
    /// let plan = Plan::initial(Role::Regulator);
    /// let edited = plan.with_assumption(|a| a.ev_adoption_rate = 0.6);
    /// assert_eq!(edited.assumptions().ev_adoption_rate, 0.6);
    /// assert_eq!(plan.assumptions().ev_adoption_rate, 0.35);
    /// ```
    pub fn with_assumption(&self, edit: impl FnOnce(&mut Assumptions)) -> Self {
        let mut assumptions = self.assumptions;
        edit(&mut assumptions);
        self.with_assumptions(assumptions)
    }

    pub fn total_capex_usd(&self) -> f64 {
        self.projects.iter().map(|p| p.capex_usd).sum()
    }

    /// Budget cap minus total capex. Negative when over budget.
    pub fn budget_remaining_usd(&self) -> f64 {
        self.assumptions.budget_cap_usd - self.total_capex_usd()
    }

    pub fn over_budget(&self) -> bool {
        self.budget_remaining_usd() < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, zone: &str) -> Project {
        Project {
            id: id.to_string(),
            name: format!("Project {id}"),
            project_type: ProjectType::BatteryStorage,
            zone_id: zone.to_string(),
            node_id: None,
            capex_usd: 40_000_000.0,
            effects: EffectBundle {
                capacity_boost_mw: Some(30.0),
                ..EffectBundle::default()
            },
            description: String::new(),
        }
    }

    fn base() -> Plan {
        Plan::new("plan-a", "Plan A", Role::UtilityPlanner, Assumptions::default())
    }

    #[test]
    fn apply_is_idempotent() {
        let p = project("p1", "z-1");
        let once = base().apply_project(&p);
        let twice = once.apply_project(&p);
        assert_eq!(twice.projects().len(), 1);
        assert_eq!(twice.id(), "plan-a-pp1");
        assert_eq!(once, twice);
    }

    #[test]
    fn apply_and_remove_leave_input_untouched() {
        let plan = base();
        let with = plan.apply_project(&project("p1", "z-1"));
        assert!(plan.projects().is_empty());
        assert_eq!(plan.id(), "plan-a");

        let without = with.remove_project("p1");
        assert_eq!(with.projects().len(), 1);
        assert!(without.projects().is_empty());
        assert_eq!(without.id(), "plan-a");
    }

    #[test]
    fn remove_absent_project_is_a_noop() {
        let plan = base().apply_project(&project("p1", "z-1"));
        assert_eq!(plan.remove_project("p9"), plan);
    }

    #[test]
    fn remove_strips_only_its_own_segment() {
        let plan = base()
            .apply_project(&project("p1", "z-1"))
            .apply_project(&project("p2", "z-1"));
        assert_eq!(plan.id(), "plan-a-pp1-pp2");
        let trimmed = plan.remove_project("p1");
        assert_eq!(trimmed.id(), "plan-a-pp2");
        assert_eq!(trimmed.projects()[0].id, "p2");
    }

    #[test]
    fn from_parts_rejects_duplicate_projects() {
        let err = Plan::from_parts(
            "x",
            "x",
            Role::Advocate,
            vec![project("p1", "z-1"), project("p1", "z-2")],
            Assumptions::for_role(Role::Advocate),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::DuplicateId { kind: "project", .. }));
    }

    #[test]
    fn budget_helpers_track_capex() {
        let plan = Plan::new(
            "b",
            "b",
            Role::UtilityPlanner,
            Assumptions {
                budget_cap_usd: 50_000_000.0,
                ..Assumptions::default()
            },
        );
        let one = plan.apply_project(&project("p1", "z"));
        assert_eq!(one.total_capex_usd(), 40_000_000.0);
        assert_eq!(one.budget_remaining_usd(), 10_000_000.0);
        assert!(!one.over_budget());
        assert!(one.apply_project(&project("p2", "z")).over_budget());
    }

    #[test]
    fn role_presets_differ() {
        let reg = Assumptions::for_role(Role::Regulator);
        assert_eq!(reg.ev_adoption_rate, 0.35);
        assert_eq!(reg.budget_cap_usd, 200_000_000.0);
        assert_eq!(Assumptions::default().population_growth_rate, 3.2);
        assert_eq!(Assumptions::for_role(Role::Advocate).renewable_target, 0.60);
    }

    #[test]
    fn initial_plan_id_carries_role() {
        let plan = Plan::initial(Role::Advocate);
        assert!(plan.id().starts_with("plan_advocate_"));
        assert!(plan.projects().is_empty());
        assert_eq!(plan.assumptions().budget_cap_usd, 250_000_000.0);
    }

    #[test]
    fn effects_clamp_on_read() {
        let effects = EffectBundle {
            capacity_boost_mw: Some(250.0),
            vulnerability_reduction: Some(-0.2),
            cascade_resistance: Some(f64::NAN),
            recovery_speed_boost: Some(1.7),
            ..EffectBundle::default()
        };
        assert_eq!(effects.capacity_boost_mw(), 100.0);
        assert_eq!(effects.vulnerability_reduction(), 0.0);
        assert_eq!(effects.cascade_resistance(), 0.0);
        assert_eq!(effects.recovery_speed_boost(), 1.0);
        assert_eq!(effects.demand_reduction_factor(), 0.0);

        let clamped = effects.clamped();
        assert_eq!(clamped.capacity_boost_mw, Some(100.0));
        assert_eq!(clamped.vulnerability_reduction, None);
    }

    #[test]
    fn project_matching_uses_node_or_zone() {
        let mut p = project("p1", "z-1");
        assert!(p.targets_node("n-9", "z-1"));
        assert!(!p.targets_node("n-9", "z-2"));
        p.node_id = Some("n-9".to_string());
        assert!(p.targets_node("n-9", "z-2"));
        assert!(!p.targets_zone("z-2"));
    }

    #[test]
    fn plan_json_rejects_duplicate_project_ids() {
        let plan = base().apply_project(&project("p1", "z-1"));
        let mut value = serde_json::to_value(&plan).expect("serialize");
        let dup = value["projects"][0].clone();
        value["projects"]
            .as_array_mut()
            .expect("projects array")
            .push(dup);
        assert!(serde_json::from_value::<Plan>(value).is_err());
    }

    #[test]
    fn plan_json_round_trips() {
        let plan = base().apply_project(&project("p1", "z-1"));
        let json = serde_json::to_string(&plan).expect("serialize");
        let back: Plan = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, plan);
    }

    #[test]
    fn project_type_parses_snake_case() {
        assert_eq!(
            "district_hvac".parse::<ProjectType>(),
            Ok(ProjectType::DistrictHvac)
        );
        assert!("nuclear".parse::<ProjectType>().is_err());
    }
}
