use crate::scenario::Scenario;

/// Conditions for one simulated hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub hour: usize,
    pub demand_multiplier: f64,
    pub weather_stress: f64,
}

/// Hour-by-hour cursor over a scenario's curves.
///
/// The `Clock` provides methods to advance one hour at a time or run a
/// function at each hour until the scenario horizon is reached.
///
/// # Examples
///
/// ```
/// use gridcase_sim::scenario::{Hazard, Scenario};
/// use gridcase_sim::sim::clock::Clock;
///
/// let scenario = Scenario {
///     id: "s".into(),
///     name: "s".into(),
///     description: String::new(),
///     duration_hours: 3,
///     hazard: Hazard::DemandGrowth,
///     demand_curve: vec![1.0, 1.2, 1.4],
///     weather_stress_curve: vec![0.0, 0.1, 0.2],
/// };
/// let mut clock = Clock::new(&scenario);
/// let mut hours = Vec::new();
///
/// clock.run(|tick| hours.push(tick.hour));
/// assert_eq!(hours, vec![0, 1, 2]);
/// ```
pub struct Clock<'a> {
    scenario: &'a Scenario,
    current: usize,
}

impl<'a> Clock<'a> {
    pub fn new(scenario: &'a Scenario) -> Self {
        Self {
            scenario,
            current: 0,
        }
    }

    /// Advances the clock by one hour.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - Conditions for the hour just entered
    /// * `None` - If the scenario horizon has been reached
    ///
    /// Curve entries past the end (only possible on an unvalidated scenario)
    /// read as a demand multiplier of 1 and zero weather stress.
    pub fn tick(&mut self) -> Option<Tick> {
        if self.current >= self.scenario.duration_hours {
            return None;
        }
        let hour = self.current;
        self.current += 1;
        Some(Tick {
            hour,
            demand_multiplier: self.scenario.demand_curve.get(hour).copied().unwrap_or(1.0),
            weather_stress: self
                .scenario
                .weather_stress_curve
                .get(hour)
                .copied()
                .unwrap_or(0.0),
        })
    }

    /// Runs a function for each remaining hour.
    pub fn run(&mut self, mut f: impl FnMut(Tick)) {
        while let Some(tick) = self.tick() {
            f(tick);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Hazard;

    fn scenario(hours: usize) -> Scenario {
        Scenario {
            id: "s".into(),
            name: "s".into(),
            description: String::new(),
            duration_hours: hours,
            hazard: Hazard::Freeze,
            demand_curve: (0..hours).map(|h| 1.0 + h as f64 * 0.1).collect(),
            weather_stress_curve: (0..hours).map(|h| h as f64 * 0.05).collect(),
        }
    }

    #[test]
    fn test_tick() {
        let sc = scenario(2);
        let mut clock = Clock::new(&sc);
        let first = clock.tick().expect("hour 0");
        assert_eq!(first.hour, 0);
        assert_eq!(first.demand_multiplier, 1.0);
        let second = clock.tick().expect("hour 1");
        assert_eq!(second.weather_stress, 0.05);
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn test_run() {
        let sc = scenario(4);
        let mut clock = Clock::new(&sc);
        let mut hours = Vec::new();
        clock.run(|t| hours.push(t.hour));
        assert_eq!(hours, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_clock() {
        let sc = scenario(0);
        let mut clock = Clock::new(&sc);
        assert_eq!(clock.tick(), None);

        let mut was_called = false;
        clock.run(|_| was_called = true);
        assert!(!was_called);
    }

    #[test]
    fn short_curves_read_neutral_values() {
        let mut sc = scenario(2);
        sc.demand_curve.truncate(1);
        sc.weather_stress_curve.clear();
        let mut clock = Clock::new(&sc);
        clock.tick();
        let t = clock.tick().expect("hour 1");
        assert_eq!(t.demand_multiplier, 1.0);
        assert_eq!(t.weather_stress, 0.0);
    }
}
