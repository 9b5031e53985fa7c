//! Run-to-run comparison.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::sim::SimulationResult;

/// Outage-hour changes within this band are treated as noise.
pub const DEAD_BAND_HOURS: f64 = 0.5;

/// `alt - base` for the headline metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDeltas {
    pub stability_score: f64,
    pub equity_score: f64,
    pub cost_efficiency: f64,
    pub total_outage_hours: i64,
}

/// Difference between a baseline run and an alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDelta {
    pub base_result_id: String,
    pub alt_result_id: String,
    pub metric_deltas: MetricDeltas,
    /// Zones from both runs; base order first, then zones only in `alt`.
    pub outage_by_zone_delta: IndexMap<String, i64>,
    /// Zones whose outage hours fell by more than the dead band.
    pub improved_zones: Vec<String>,
    /// Zones whose outage hours rose by more than the dead band.
    pub worsened_zones: Vec<String>,
}

impl ComparisonDelta {
    /// Compares `alt` against `base`. Zones missing from either side count
    /// as zero outage hours.
    pub fn between(base: &SimulationResult, alt: &SimulationResult) -> Self {
        let zones = base
            .outage_by_zone
            .keys()
            .chain(alt.outage_by_zone.keys().filter(|z| !base.outage_by_zone.contains_key(*z)));

        let mut outage_by_zone_delta = IndexMap::new();
        let mut improved_zones = Vec::new();
        let mut worsened_zones = Vec::new();
        for zone in zones {
            let before = i64::from(base.outage_by_zone.get(zone).copied().unwrap_or(0));
            let after = i64::from(alt.outage_by_zone.get(zone).copied().unwrap_or(0));
            let delta = after - before;
            if (delta as f64) < -DEAD_BAND_HOURS {
                improved_zones.push(zone.clone());
            } else if (delta as f64) > DEAD_BAND_HOURS {
                worsened_zones.push(zone.clone());
            }
            outage_by_zone_delta.insert(zone.clone(), delta);
        }

        let (b, a) = (&base.metrics, &alt.metrics);
        Self {
            base_result_id: base.id.clone(),
            alt_result_id: alt.id.clone(),
            metric_deltas: MetricDeltas {
                stability_score: a.stability_score - b.stability_score,
                equity_score: a.equity_score - b.equity_score,
                cost_efficiency: a.cost_efficiency - b.cost_efficiency,
                total_outage_hours: i64::from(a.total_outage_hours)
                    - i64::from(b.total_outage_hours),
            },
            outage_by_zone_delta,
            improved_zones,
            worsened_zones,
        }
    }
}

/// Convenience wrapper for [`ComparisonDelta::between`].
pub fn compare_results(base: &SimulationResult, alt: &SimulationResult) -> ComparisonDelta {
    ComparisonDelta::between(base, alt)
}

impl fmt::Display for ComparisonDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.metric_deltas;
        writeln!(f, "--- Comparison {} -> {} ---", self.base_result_id, self.alt_result_id)?;
        writeln!(f, "Stability delta:       {:+.4}", d.stability_score)?;
        writeln!(f, "Equity delta:          {:+.4}", d.equity_score)?;
        writeln!(f, "Cost efficiency delta: {:+.3}", d.cost_efficiency)?;
        writeln!(f, "Outage hours delta:    {:+}", d.total_outage_hours)?;
        writeln!(f, "Improved zones:        {}", self.improved_zones.join(", "))?;
        write!(f, "Worsened zones:        {}", self.worsened_zones.join(", "))
    }
}
