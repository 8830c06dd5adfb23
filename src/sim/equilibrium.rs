//! Incentive equilibrium for one demand-response event.
//!
//! The solver offers an incentive as a percentage of the appliance's
//! monthly cost, asks the participation model how many households accept,
//! values the energy they would shift at market prices and moves the offer
//! towards the percentage that value supports. A damped fixed-point loop
//! with a hard iteration cap keeps the offer inside its per-event bounds.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, warn};

use crate::config::{ApplianceConfig, MonthlyEnergy, StudyConfig};
use crate::series::{AlignedSlot, EnergySeries, PriceSeries, align};

use super::event::{EventSpec, SimulationEvent};
use super::participation::ParticipationSource;

const NEGLIGIBLE: f64 = 1e-12;

/// Fixed-point loop and compensation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    pub max_iterations: usize,
    /// Weight of the previous offer in each update (0..1).
    pub damping: f64,
    /// Convergence tolerance in percentage points.
    pub tolerance_pct: f64,
    pub population_participation_cap: f64,
    pub global_max_compensation_pct: f64,
    pub benchmark_price_per_kwh: f64,
}

impl SolverSettings {
    pub fn from_config(config: &StudyConfig) -> Self {
        Self {
            max_iterations: config.solver.max_iterations,
            damping: config.solver.damping,
            tolerance_pct: config.solver.tolerance_pct,
            population_participation_cap: config.compensation.population_participation_cap,
            global_max_compensation_pct: config.compensation.global_max_compensation_pct,
            benchmark_price_per_kwh: config.compensation.benchmark_price_per_kwh,
        }
    }
}

/// State after one round of the offer iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfferStep {
    /// 1-based round number.
    pub iteration: usize,
    /// Offer the participation model was queried with.
    pub offered_pct: f64,
    pub raw_rate: f64,
    pub capped_rate: f64,
    pub shifted_energy_kwh: f64,
    pub market_value: f64,
    /// Clamped target before damping.
    pub target_pct: f64,
    /// Damped offer carried into the next round.
    pub offer_pct: f64,
}

/// Result of [`iterate_offer`].
#[derive(Debug, Clone, PartialEq)]
pub struct OfferOutcome {
    pub offer_pct: f64,
    pub raw_rate: f64,
    pub capped_rate: f64,
    pub shifted_energy_kwh: f64,
    pub market_value: f64,
    pub unit_payout_per_kwh: f64,
    pub iterations: usize,
    pub converged: bool,
    pub trace: Vec<OfferStep>,
}

fn unit_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Runs the damped offer iteration over aligned window slots.
///
/// Every offer stays within `[0, min(global_max, event_max_pct)]`. The loop
/// stops once successive offers differ by at most the tolerance, or after
/// `max_iterations` rounds with `converged = false`.
pub fn iterate_offer<P: ParticipationSource>(
    source: &P,
    slots: &[AlignedSlot],
    duration_hours: f64,
    event_max_pct: f64,
    settings: &SolverSettings,
) -> OfferOutcome {
    let ceiling = settings
        .global_max_compensation_pct
        .min(event_max_pct)
        .max(0.0);

    let mut offer = 0.0_f64;
    let mut prev = -1.0_f64;
    let mut iterations = 0;
    let mut trace = Vec::new();
    let mut last = (0.0, 0.0, 0.0, 0.0);

    while (offer - prev).abs() > settings.tolerance_pct && iterations < settings.max_iterations {
        prev = offer;
        iterations += 1;

        let raw_rate = unit_rate(source.participation_rate(duration_hours, prev));
        let capped_rate = raw_rate.min(settings.population_participation_cap);

        let shifted: f64 = slots.iter().map(|s| s.energy_kwh * capped_rate).sum();
        let (value, target) = if shifted <= NEGLIGIBLE {
            (0.0, 0.0)
        } else {
            let value: f64 = slots
                .iter()
                .map(|s| s.energy_kwh * capped_rate * s.price_per_kwh)
                .sum();
            let basis = shifted * settings.benchmark_price_per_kwh;
            let target = if basis > NEGLIGIBLE { value / basis * 100.0 } else { 0.0 };
            (value, target)
        };
        let target = if target.is_finite() { target.min(ceiling).max(0.0) } else { 0.0 };

        offer = settings.damping * prev + (1.0 - settings.damping) * target;

        trace.push(OfferStep {
            iteration: iterations,
            offered_pct: prev,
            raw_rate,
            capped_rate,
            shifted_energy_kwh: shifted,
            market_value: value,
            target_pct: target,
            offer_pct: offer,
        });
        last = (raw_rate, capped_rate, shifted, value);
    }

    let (raw_rate, capped_rate, shifted, value) = last;
    OfferOutcome {
        offer_pct: offer,
        raw_rate,
        capped_rate,
        shifted_energy_kwh: shifted,
        market_value: value,
        unit_payout_per_kwh: if shifted > NEGLIGIBLE { value / shifted } else { 0.0 },
        iterations,
        converged: (offer - prev).abs() <= settings.tolerance_pct,
        trace,
    }
}

/// Days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (y, m) = (date.year(), date.month());
    let next = if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1)
    };
    let first = NaiveDate::from_ymd_opt(y, m, 1);
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 30,
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    Some(values.sum::<f64>() / n as f64)
}

/// Solves events against fixed price, load and survey inputs.
///
/// Holds only shared references; solving the same event twice yields
/// identical records.
pub struct EquilibriumSolver<'a, P: ParticipationSource> {
    source: &'a P,
    prices: &'a PriceSeries,
    energy: &'a EnergySeries,
    appliance: &'a ApplianceConfig,
    settings: SolverSettings,
    interval: Duration,
}

impl<'a, P: ParticipationSource> EquilibriumSolver<'a, P> {
    /// Creates a solver.
    ///
    /// # Arguments
    ///
    /// * `config` - Study configuration (appliance, compensation, solver)
    /// * `source` - Participation model for the appliance
    /// * `prices` - Market prices on the same scale as the selected peaks
    /// * `energy` - Appliance energy per interval
    pub fn new(
        config: &'a StudyConfig,
        source: &'a P,
        prices: &'a PriceSeries,
        energy: &'a EnergySeries,
    ) -> Self {
        Self {
            source,
            prices,
            energy,
            appliance: &config.appliance,
            settings: SolverSettings::from_config(config),
            interval: Duration::minutes(i64::from(config.data.interval_minutes)),
        }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Price and load slots shared by both series inside the event window.
    pub fn window_slots(&self, spec: &EventSpec) -> Vec<AlignedSlot> {
        let (start, end) = (spec.start(), spec.end());
        align(&self.energy.slice(start, end), &self.prices.slice(start, end))
    }

    /// Solves one event.
    ///
    /// Degenerate windows (no common slots, no load, invalid prices, nothing
    /// payable) produce a zero record with an `error_message` instead of an
    /// error.
    pub fn solve(&self, spec: &EventSpec) -> SimulationEvent {
        let slots = self.window_slots(spec);
        if slots.is_empty() {
            let minutes = self.interval.num_minutes();
            return self.reject(*spec, format!("No common {minutes}-min slots in window"));
        }

        let window_energy: f64 = slots.iter().map(|s| s.energy_kwh).sum();
        let avg_price_window = mean(slots.iter().map(|s| s.price_per_kwh));

        let hours_paid_cap = spec
            .duration_hours
            .min(self.appliance.max_event_hours_paid)
            .min(self.appliance.cycle_hours);
        let avg_cycle_power = if self.appliance.cycle_hours > 0.0 {
            self.appliance.cycle_energy_kwh / self.appliance.cycle_hours
        } else {
            0.0
        };
        let energy_cap = self
            .appliance
            .cycle_energy_kwh
            .min(avg_cycle_power * hours_paid_cap);

        let monthly_energy = match self.appliance.monthly_energy {
            MonthlyEnergy::FixedMonthlyKwh(kwh) => kwh,
            MonthlyEnergy::DailyKwh(kwh) => {
                kwh * f64::from(days_in_month(spec.start().date_naive()))
            }
        };
        let monthly_cost = monthly_energy * self.settings.benchmark_price_per_kwh;

        let interval_hours = self.interval.num_seconds() as f64 / 3600.0;
        let paid_slots = (hours_paid_cap / interval_hours).round().max(0.0) as usize;
        let avg_price_paid = mean(slots.iter().take(paid_slots).map(|s| s.price_per_kwh));

        let mut event = SimulationEvent::degenerate(*spec, "");
        event.slots = slots.len();
        event.window_energy_kwh = window_energy;
        event.avg_price_window = avg_price_window;
        event.avg_price_paid = avg_price_paid;
        event.hours_paid_cap = hours_paid_cap;
        event.energy_cap_kwh = energy_cap;
        event.monthly_energy_kwh = monthly_energy;
        event.monthly_cost = monthly_cost;

        if window_energy <= NEGLIGIBLE {
            return self.reject_with(event, "No appliance load in window");
        }
        if !avg_price_window.is_some_and(f64::is_finite) {
            return self.reject_with(event, "Invalid market price in window");
        }
        if energy_cap <= NEGLIGIBLE {
            return self.reject_with(event, "No energy payable under the event caps");
        }
        let Some(avg_price_paid) = avg_price_paid.filter(|p| p.is_finite() && *p >= 0.0) else {
            return self.reject_with(event, "No valid market price in paid hours");
        };

        let event_max_compensation = avg_price_paid * energy_cap;
        let event_max_pct = if monthly_cost > NEGLIGIBLE {
            event_max_compensation / monthly_cost * 100.0
        } else {
            0.0
        };
        event.event_max_compensation = event_max_compensation;
        event.event_max_compensation_pct = event_max_pct;

        let outcome = iterate_offer(
            self.source,
            &slots,
            spec.duration_hours,
            event_max_pct,
            &self.settings,
        );
        debug!(
            date = %spec.date,
            offset_h = spec.pre_peak_offset_hours,
            duration_h = spec.duration_hours,
            iterations = outcome.iterations,
            converged = outcome.converged,
            offer_pct = outcome.offer_pct,
            "event solved"
        );

        event.offer_pct = outcome.offer_pct;
        event.raw_participation_rate = outcome.raw_rate;
        event.capped_participation_rate = outcome.capped_rate;
        event.shifted_energy_kwh = outcome.shifted_energy_kwh;
        event.market_value = outcome.market_value;
        event.unit_payout_per_kwh = outcome.unit_payout_per_kwh;
        event.compensation_per_household =
            (outcome.offer_pct / 100.0 * monthly_cost).min(event_max_compensation);
        event.iterations = outcome.iterations;
        event.converged = outcome.converged;
        event.error_message = None;
        event
    }

    fn reject(&self, spec: EventSpec, message: String) -> SimulationEvent {
        warn!(date = %spec.date, start = %spec.start(), reason = %message, "degenerate event");
        SimulationEvent::degenerate(spec, message)
    }

    fn reject_with(&self, mut event: SimulationEvent, message: &str) -> SimulationEvent {
        warn!(date = %event.spec.date, start = %event.event_start, reason = message, "degenerate event");
        event.error_message = Some(message.to_string());
        event
    }
}
