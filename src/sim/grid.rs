//! Scaling of household results to the grid population.

use std::fmt;

use super::event::SimulationEvent;

/// Which ceiling limits the shiftable energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingConstraint {
    /// Appliance energy available in the window at the achieved participation.
    WindowLimit,
    /// Participating households times the per-household energy cap.
    PerHouseholdCap,
    /// The event was degenerate.
    NoData,
}

impl BindingConstraint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WindowLimit => "window_limit",
            Self::PerHouseholdCap => "per_household_cap",
            Self::NoData => "no_data",
        }
    }
}

impl fmt::Display for BindingConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grid-level outcome of one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOutcome {
    pub households_in_scope: u64,
    pub window_limit_kwh: f64,
    pub household_limit_kwh: f64,
    /// `min(window_limit_kwh, household_limit_kwh)`.
    pub shiftable_energy_kwh: f64,
    pub binding_constraint: BindingConstraint,
    /// Programme payout: participating households × per-household compensation.
    pub total_compensation: f64,
}

/// Scales a solved event to `households_in_scope`.
///
/// Ties between the two limits favour [`BindingConstraint::WindowLimit`].
pub fn aggregate(event: &SimulationEvent, households_in_scope: u64) -> GridOutcome {
    if event.is_degenerate() {
        return GridOutcome {
            households_in_scope,
            window_limit_kwh: 0.0,
            household_limit_kwh: 0.0,
            shiftable_energy_kwh: 0.0,
            binding_constraint: BindingConstraint::NoData,
            total_compensation: 0.0,
        };
    }

    let rate = event.capped_participation_rate;
    let households = households_in_scope as f64;
    let window_limit = event.window_energy_kwh * rate;
    let household_limit = households * rate * event.energy_cap_kwh;

    let (shiftable, binding) = if window_limit <= household_limit {
        (window_limit, BindingConstraint::WindowLimit)
    } else {
        (household_limit, BindingConstraint::PerHouseholdCap)
    };

    GridOutcome {
        households_in_scope,
        window_limit_kwh: window_limit,
        household_limit_kwh: household_limit,
        shiftable_energy_kwh: shiftable,
        binding_constraint: binding,
        total_compensation: households * rate * event.compensation_per_household,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::EventSpec;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn event(window_energy: f64, rate: f64, cap: f64) -> SimulationEvent {
        let spec = EventSpec {
            date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            rank: 1,
            reference_peak: Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap(),
            pre_peak_offset_hours: 1.0,
            duration_hours: 3.0,
        };
        let mut e = SimulationEvent::degenerate(spec, "");
        e.error_message = None;
        e.window_energy_kwh = window_energy;
        e.capped_participation_rate = rate;
        e.energy_cap_kwh = cap;
        e.compensation_per_household = 0.5;
        e
    }

    #[test]
    fn household_cap_binds_for_small_populations() {
        let g = aggregate(&event(10_000.0, 0.5, 1.44), 1000);
        assert_eq!(g.window_limit_kwh, 5000.0);
        assert!((g.household_limit_kwh - 720.0).abs() < 1e-9);
        assert_eq!(g.binding_constraint, BindingConstraint::PerHouseholdCap);
        assert_eq!(g.shiftable_energy_kwh, g.household_limit_kwh);
        assert!((g.total_compensation - 250.0).abs() < 1e-9);
    }

    #[test]
    fn window_limit_binds_for_large_populations() {
        let g = aggregate(&event(100.0, 0.5, 1.44), 100_000);
        assert_eq!(g.binding_constraint, BindingConstraint::WindowLimit);
        assert_eq!(g.shiftable_energy_kwh, 50.0);
        assert_eq!(
            g.shiftable_energy_kwh,
            g.window_limit_kwh.min(g.household_limit_kwh)
        );
    }

    #[test]
    fn ties_favour_window_limit() {
        let g = aggregate(&event(200.0, 0.5, 2.0), 100);
        assert_eq!(g.window_limit_kwh, g.household_limit_kwh);
        assert_eq!(g.binding_constraint, BindingConstraint::WindowLimit);
    }

    #[test]
    fn degenerate_event_has_no_data() {
        let mut e = event(100.0, 0.5, 1.44);
        e.error_message = Some("No common 15-min slots in window".into());
        let g = aggregate(&e, 100_000);
        assert_eq!(g.binding_constraint, BindingConstraint::NoData);
        assert_eq!(g.shiftable_energy_kwh, 0.0);
        assert_eq!(g.binding_constraint.to_string(), "no_data");
    }
}
