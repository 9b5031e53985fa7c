//! Post-hoc summary metrics for a completed run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Summary scores for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Fraction of node-hours operational, in `[0, 1]`.
    pub stability_score: f64,
    /// `1 - max(0, corr(outage hours, 1 / median income))` across zones, in
    /// `[0, 1]`. Lower when low-income zones bear more outage.
    pub equity_score: f64,
    /// Stability points per $100M of capex, in `[0, 10]`.
    pub cost_efficiency: f64,
    pub total_outage_hours: u32,
    /// Highest stress ratio seen, clamped to `[0, 2]`.
    pub peak_stress_level: f64,
    pub nodes_failed_count: u32,
    pub cascade_count: u32,
}

/// Raw counters gathered by the hourly loop.
#[derive(Debug, Clone, Default)]
pub struct RunTotals<'a> {
    pub node_count: usize,
    pub duration_hours: usize,
    pub uptime_hours: u64,
    /// Per-zone outage hours, in catalog order.
    pub zone_outage_hours: &'a [u32],
    /// Per-zone median income, in catalog order.
    pub zone_median_income: &'a [f64],
    pub total_capex_usd: f64,
    pub peak_stress: f64,
    pub nodes_failed: u32,
    pub cascades: u32,
}

impl RunMetrics {
    /// Computes all metrics from a run's counters.
    pub fn from_totals(t: &RunTotals<'_>) -> Self {
        let possible = t.node_count as f64 * t.duration_hours as f64;
        let stability_score = if possible > 0.0 {
            (t.uptime_hours as f64 / possible).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let outages: Vec<f64> = t.zone_outage_hours.iter().map(|&h| f64::from(h)).collect();
        let inverse_income: Vec<f64> = t.zone_median_income.iter().map(|&i| 1.0 / i).collect();
        let corr = pearson(&outages, &inverse_income);
        let equity_score = (1.0 - corr.max(0.0)).clamp(0.0, 1.0);

        let cost_efficiency = if t.total_capex_usd > 0.0 {
            (stability_score * 100.0 / (t.total_capex_usd / 1_000_000.0)).clamp(0.0, 10.0)
        } else {
            stability_score * 10.0
        };

        let peak = if t.peak_stress.is_finite() {
            t.peak_stress
        } else {
            2.0
        };

        Self {
            stability_score,
            equity_score,
            cost_efficiency,
            total_outage_hours: t.zone_outage_hours.iter().sum(),
            peak_stress_level: peak.clamp(0.0, 2.0),
            nodes_failed_count: t.nodes_failed,
            cascade_count: t.cascades,
        }
    }
}

impl fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Metrics ---")?;
        writeln!(f, "Stability score:       {:.4}", self.stability_score)?;
        writeln!(f, "Equity score:          {:.4}", self.equity_score)?;
        writeln!(f, "Cost efficiency:       {:.3}", self.cost_efficiency)?;
        writeln!(f, "Total outage hours:    {}", self.total_outage_hours)?;
        writeln!(f, "Peak stress level:     {:.3}", self.peak_stress_level)?;
        writeln!(f, "Nodes failed:          {}", self.nodes_failed_count)?;
        write!(f, "Cascade failures:      {}", self.cascade_count)
    }
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Pearson correlation coefficient.
///
/// Returns 0 when the slices differ in length, hold fewer than two values,
/// or either has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }
    let (mx, my) = (mean(xs), mean(ys));
    let (mut num, mut dx2, mut dy2) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        num += dx * dy;
        dx2 += dx * dx;
        dy2 += dy * dy;
    }
    let denom = (dx2 * dy2).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        0.0
    } else {
        num / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals<'a>(outage: &'a [u32], income: &'a [f64]) -> RunTotals<'a> {
        RunTotals {
            node_count: 2,
            duration_hours: 10,
            uptime_hours: 15,
            zone_outage_hours: outage,
            zone_median_income: income,
            total_capex_usd: 0.0,
            peak_stress: 1.3,
            nodes_failed: 1,
            cascades: 0,
        }
    }

    #[test]
    fn pearson_edge_cases() {
        assert_eq!(pearson(&[1.0], &[2.0]), 0.0);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(pearson(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn stability_and_cost_efficiency_without_capex() {
        let m = RunMetrics::from_totals(&totals(&[4, 0], &[30_000.0, 90_000.0]));
        assert!((m.stability_score - 0.75).abs() < 1e-12);
        assert!((m.cost_efficiency - 7.5).abs() < 1e-12);
        assert_eq!(m.total_outage_hours, 4);
    }

    #[test]
    fn outages_in_poor_zones_lower_equity() {
        let unfair = RunMetrics::from_totals(&totals(&[10, 0], &[30_000.0, 90_000.0]));
        let fair = RunMetrics::from_totals(&totals(&[0, 10], &[30_000.0, 90_000.0]));
        assert_eq!(unfair.equity_score, 0.0);
        assert_eq!(fair.equity_score, 1.0);
    }

    #[test]
    fn cost_efficiency_scales_with_capex() {
        let mut t = totals(&[0, 0], &[1.0, 2.0]);
        t.total_capex_usd = 150_000_000.0;
        let m = RunMetrics::from_totals(&t);
        assert!((m.cost_efficiency - 0.5).abs() < 1e-12);
        t.total_capex_usd = 1_000_000.0;
        assert_eq!(RunMetrics::from_totals(&t).cost_efficiency, 10.0);
    }

    #[test]
    fn peak_stress_is_clamped() {
        let mut t = totals(&[0, 0], &[1.0, 2.0]);
        t.peak_stress = 7.0;
        assert_eq!(RunMetrics::from_totals(&t).peak_stress_level, 2.0);
        t.peak_stress = f64::INFINITY;
        assert_eq!(RunMetrics::from_totals(&t).peak_stress_level, 2.0);
    }

    #[test]
    fn display_lists_every_metric() {
        let m = RunMetrics::from_totals(&totals(&[1, 2], &[1.0, 2.0]));
        let text = m.to_string();
        assert!(text.contains("Stability score"));
        assert!(text.contains("Cascade failures"));
    }
}
