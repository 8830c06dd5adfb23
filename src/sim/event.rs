//! Demand-response event definitions and the per-event result record.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Converts fractional hours to a duration, rounded to the millisecond.
pub(crate) fn hours(h: f64) -> Duration {
    Duration::milliseconds((h * 3_600_000.0).round() as i64)
}

/// One candidate event: a ranked day's reference peak, a pre-peak offset
/// and a duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventSpec {
    pub date: NaiveDate,
    /// Rank of the day among the candidate days (1-based).
    pub rank: usize,
    pub reference_peak: DateTime<Utc>,
    pub pre_peak_offset_hours: f64,
    pub duration_hours: f64,
}

impl EventSpec {
    /// Event start: the reference peak minus the offset.
    pub fn start(&self) -> DateTime<Utc> {
        self.reference_peak - hours(self.pre_peak_offset_hours)
    }

    /// Exclusive event end.
    pub fn end(&self) -> DateTime<Utc> {
        self.start() + hours(self.duration_hours)
    }

    /// Returns `true` when `t` falls within `[start, end)`.
    pub fn is_active(&self, t: DateTime<Utc>) -> bool {
        t >= self.start() && t < self.end()
    }
}

/// Result of solving one event.
///
/// Degenerate events carry zero outputs, `iterations == 0` and an
/// `error_message`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationEvent {
    pub spec: EventSpec,
    pub event_start: DateTime<Utc>,
    /// Intervals present in both the price and the load slice.
    pub slots: usize,
    /// Appliance energy in the event window (kWh).
    pub window_energy_kwh: f64,
    /// Mean market price over the whole window.
    pub avg_price_window: Option<f64>,
    /// Mean market price over the paid-hours prefix of the window.
    pub avg_price_paid: Option<f64>,
    pub hours_paid_cap: f64,
    /// Energy compensated per participating household (kWh).
    pub energy_cap_kwh: f64,
    pub monthly_energy_kwh: f64,
    pub monthly_cost: f64,
    /// Upper bound on the per-household payout for this event.
    pub event_max_compensation: f64,
    /// `event_max_compensation` as a percentage of `monthly_cost`.
    pub event_max_compensation_pct: f64,
    /// Converged incentive, percent of the monthly cost basis.
    pub offer_pct: f64,
    pub raw_participation_rate: f64,
    /// Participation after the population cap.
    pub capped_participation_rate: f64,
    pub shifted_energy_kwh: f64,
    pub market_value: f64,
    pub unit_payout_per_kwh: f64,
    pub compensation_per_household: f64,
    pub iterations: usize,
    pub converged: bool,
    pub error_message: Option<String>,
}

impl SimulationEvent {
    /// A zero-valued record for an event that could not be simulated.
    pub fn degenerate(spec: EventSpec, message: impl Into<String>) -> Self {
        Self {
            spec,
            event_start: spec.start(),
            slots: 0,
            window_energy_kwh: 0.0,
            avg_price_window: None,
            avg_price_paid: None,
            hours_paid_cap: 0.0,
            energy_cap_kwh: 0.0,
            monthly_energy_kwh: 0.0,
            monthly_cost: 0.0,
            event_max_compensation: 0.0,
            event_max_compensation_pct: 0.0,
            offer_pct: 0.0,
            raw_participation_rate: 0.0,
            capped_participation_rate: 0.0,
            shifted_energy_kwh: 0.0,
            market_value: 0.0,
            unit_payout_per_kwh: 0.0,
            compensation_per_household: 0.0,
            iterations: 0,
            converged: false,
            error_message: Some(message.into()),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.error_message.is_some()
    }
}
