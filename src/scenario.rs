//! Weather and demand scenarios: hourly curves plus a hazard profile.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Which weather mechanics a scenario switches on.
///
/// `Freeze` enables infrastructure-age capacity loss and flood damage;
/// `HeatDome` enables heat-sensitivity load amplification; `DemandGrowth`
/// enables neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hazard {
    Freeze,
    HeatDome,
    DemandGrowth,
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Freeze => "freeze",
            Self::HeatDome => "heat_dome",
            Self::DemandGrowth => "demand_growth",
        })
    }
}

/// Built-in six-month curve shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveProfile {
    /// Winter season with an ice storm every 18 days.
    #[serde(rename = "freeze-6mo")]
    Freeze6mo,
    /// Summer season with a heat dome every 22 days.
    #[serde(rename = "heat-6mo")]
    Heat6mo,
    /// Evening EV charging load growing across the season.
    #[serde(rename = "ev-6mo")]
    Ev6mo,
}

/// Standard horizon for the built-in profiles: 180 days.
pub const SIX_MONTHS_HOURS: usize = 4320;

fn weekend(day: usize) -> bool {
    day % 7 == 0 || day % 7 == 6
}

fn progress(h: usize, hours: usize) -> f64 {
    h as f64 / hours.saturating_sub(1).max(1) as f64
}

/// Deterministic per-day pseudo-noise in `[0, 1)`.
fn day_signal(day: usize, offset: f64, freq: f64, gain: f64) -> f64 {
    (((day as f64 + offset) * freq).sin() * gain).abs() % 1.0
}

impl CurveProfile {
    pub fn hazard(self) -> Hazard {
        match self {
            Self::Freeze6mo => Hazard::Freeze,
            Self::Heat6mo => Hazard::HeatDome,
            Self::Ev6mo => Hazard::DemandGrowth,
        }
    }

    /// Hourly demand multipliers.
    pub fn demand_curve(self, hours: usize) -> Vec<f64> {
        (0..hours)
            .map(|h| {
                let day = h / 24;
                let hour = h % 24;
                let p = progress(h, hours);
                match self {
                    Self::Freeze6mo => {
                        let base = 1.45 + 0.30 * (p * PI).sin();
                        let morning = if (6..=9).contains(&hour) {
                            0.14 + (hour - 6) as f64 * 0.04
                        } else {
                            0.0
                        };
                        let evening = if (17..=21).contains(&hour) {
                            0.12 + (hour - 17) as f64 * 0.03
                        } else {
                            0.0
                        };
                        let night = if hour <= 5 { -0.08 } else { 0.0 };
                        let storm = if day % 18 < 3 { 0.22 } else { 0.0 };
                        let weekday = if weekend(day) { -0.03 } else { 0.02 };
                        (base + morning + evening + night + storm + weekday).clamp(0.90, 2.0)
                    }
                    Self::Heat6mo => {
                        let base = 1.10 + 0.45 * (p * PI).sin();
                        let afternoon = if (12..=18).contains(&hour) {
                            0.10 + if hour == 15 || hour == 16 { 0.08 } else { 0.0 }
                        } else {
                            0.0
                        };
                        let evening = if (18..=21).contains(&hour) { 0.08 } else { 0.0 };
                        let night = if hour <= 5 { -0.06 } else { 0.0 };
                        let dome = if day % 22 < 5 { 0.25 } else { 0.0 };
                        let weekday = if weekend(day) { -0.04 } else { 0.02 };
                        (base + afternoon + evening + night + dome + weekday).clamp(0.75, 1.95)
                    }
                    Self::Ev6mo => {
                        let growth = 1.0 + p * 0.55;
                        let evening = if (17..=21).contains(&hour) {
                            (0.28 + (hour - 17) as f64 * 0.06) * growth
                        } else {
                            0.0
                        };
                        let weekend_boost = if weekend(day) { 0.04 } else { 0.0 };
                        (1.05 + evening + weekend_boost).min(1.80)
                    }
                }
            })
            .collect()
    }

    /// Hourly weather stress, each value in `[0, 1]`.
    pub fn weather_stress_curve(self, hours: usize) -> Vec<f64> {
        (0..hours)
            .map(|h| {
                let day = h / 24;
                let hour = h % 24;
                let p = progress(h, hours);
                match self {
                    Self::Freeze6mo => {
                        let seasonal = 0.22 + 0.30 * (p * PI).sin();
                        let diurnal = if (2..=6).contains(&hour) {
                            0.06
                        } else if (14..=17).contains(&hour) {
                            -0.04
                        } else {
                            0.01
                        };
                        let storm = if day % 18 < 3 { 0.28 + seasonal * 0.20 } else { 0.0 };
                        let sig = day_signal(day, 3.0, 11.2137, 41293.8);
                        let spike = if sig > 0.91 { 0.14 + (sig - 0.91) * 1.8 } else { 0.0 };
                        (seasonal + diurnal + storm + spike).min(0.92)
                    }
                    Self::Heat6mo => {
                        let seasonal = 0.10 + 0.35 * (p * PI).sin();
                        let diurnal = if (11..=17).contains(&hour) {
                            0.12
                        } else if hour >= 20 || hour <= 5 {
                            -0.03
                        } else {
                            0.02
                        };
                        let dome = if day % 22 < 5 { 0.22 + seasonal * 0.35 } else { 0.0 };
                        let sig = day_signal(day, 7.0, 8.7419, 33847.2);
                        let spike = if sig > 0.93 { 0.10 } else { 0.0 };
                        (seasonal + diurnal + dome + spike).min(0.88)
                    }
                    Self::Ev6mo => 0.08 + 0.10 * (p * PI).sin(),
                }
            })
            .collect()
    }
}

/// A fixed-horizon stress test: one demand multiplier and one weather stress
/// value per simulated hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_hours: usize,
    pub hazard: Hazard,
    pub demand_curve: Vec<f64>,
    pub weather_stress_curve: Vec<f64>,
}

impl Scenario {
    /// Builds a scenario from one of the built-in curve shapes.
    pub fn from_profile(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        profile: CurveProfile,
        duration_hours: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            duration_hours,
            hazard: profile.hazard(),
            demand_curve: profile.demand_curve(duration_hours),
            weather_stress_curve: profile.weather_stress_curve(duration_hours),
        }
    }

    /// Checks that the scenario can be simulated.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidScenario`] when the horizon is zero, a curve
    /// length differs from `duration_hours`, a demand multiplier is negative
    /// or non-finite, or a weather stress value falls outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| {
            Err(SimError::InvalidScenario {
                scenario_id: self.id.clone(),
                reason,
            })
        };

        if self.duration_hours == 0 {
            return fail("duration_hours must be > 0".to_string());
        }
        if self.demand_curve.len() != self.duration_hours {
            return fail(format!(
                "demand_curve has {} entries, expected {}",
                self.demand_curve.len(),
                self.duration_hours
            ));
        }
        if self.weather_stress_curve.len() != self.duration_hours {
            return fail(format!(
                "weather_stress_curve has {} entries, expected {}",
                self.weather_stress_curve.len(),
                self.duration_hours
            ));
        }
        if let Some(h) = self
            .demand_curve
            .iter()
            .position(|v| !v.is_finite() || *v < 0.0)
        {
            return fail(format!("demand_curve[{h}] must be a finite value >= 0"));
        }
        if let Some(h) = self
            .weather_stress_curve
            .iter()
            .position(|v| !(0.0..=1.0).contains(v))
        {
            return fail(format!("weather_stress_curve[{h}] must be within [0, 1]"));
        }
        Ok(())
    }
}
