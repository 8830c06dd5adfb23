//! Batch runner over ranked days × offsets × durations.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::config::StudyConfig;
use crate::error::FlexError;
use crate::series::{EnergySeries, PriceSeries};
use crate::survey::SurveyRecord;

use super::equilibrium::EquilibriumSolver;
use super::event::{EventSpec, SimulationEvent};
use super::grid::{GridOutcome, aggregate};
use super::participation::ParticipationModel;
use super::peaks::{PeakPeriod, select_peaks};
use super::ranking::{RankedDay, WindowMap, identify_candidate_days, rank_candidate_days};
use super::window::find_windows;

/// A solved event with its grid-level outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event: SimulationEvent,
    pub grid: GridOutcome,
}

/// Peaks, windows and ranked candidate days for one study year.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRanking {
    pub peaks: Vec<PeakPeriod>,
    pub windows: WindowMap,
    pub candidate_days: Vec<NaiveDate>,
    pub ranked: Vec<RankedDay>,
}

/// Everything a batch run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub ranking: CandidateRanking,
    /// One record per simulated day × offset × duration, in that order.
    pub events: Vec<EventRecord>,
    /// Highest shiftable energy per day, by date.
    pub best_per_day: Vec<EventRecord>,
}

/// Selects peaks, finds windows on peak days and ranks the candidates.
///
/// Windows are only computed for days carrying at least one peak.
///
/// # Errors
///
/// Propagates [`select_peaks`] and [`find_windows`] errors.
pub fn rank_days(
    config: &StudyConfig,
    prices: &PriceSeries,
    energy: &EnergySeries,
) -> Result<CandidateRanking, FlexError> {
    let selection = &config.selection;
    let peaks = select_peaks(
        &prices.year(selection.year),
        selection.top_n,
        Some(selection.currency_multiplier),
    )?;
    info!(count = peaks.len(), year = selection.year, "selected price peaks");

    let peak_days: BTreeSet<NaiveDate> = peaks.iter().map(PeakPeriod::date).collect();
    let interval = Duration::minutes(i64::from(config.data.interval_minutes));
    let windows = find_windows(
        &energy.restrict_to_days(&peak_days),
        selection.threshold_pct,
        interval,
    )?;
    let with_window = windows.values().filter(|w| w.is_some()).count();
    info!(days = windows.len(), with_window, "computed energy windows");

    let candidate_days = identify_candidate_days(&peaks, &windows);
    let ranked = rank_candidate_days(&peaks, &windows);
    info!(
        candidates = candidate_days.len(),
        ranked = ranked.len(),
        "ranked candidate days"
    );

    Ok(CandidateRanking {
        peaks,
        windows,
        candidate_days,
        ranked,
    })
}

/// Event specifications for the top `simulate_days` ranked days.
pub fn event_grid(config: &StudyConfig, ranked: &[RankedDay]) -> Vec<EventSpec> {
    let grid = &config.events;
    let mut specs = Vec::new();
    for day in ranked.iter().take(grid.simulate_days) {
        for &offset in &grid.pre_peak_offsets_hours {
            for &duration in &grid.durations_hours {
                specs.push(EventSpec {
                    date: day.date,
                    rank: day.rank,
                    reference_peak: day.reference_peak,
                    pre_peak_offset_hours: offset,
                    duration_hours: duration,
                });
            }
        }
    }
    specs
}

/// Keeps the record with the most shiftable energy per day; the earliest
/// record wins ties.
pub fn best_per_day(records: &[EventRecord]) -> Vec<EventRecord> {
    let mut best: Vec<EventRecord> = Vec::new();
    for r in records {
        match best.iter_mut().find(|b| b.event.spec.date == r.event.spec.date) {
            Some(b) if r.grid.shiftable_energy_kwh > b.grid.shiftable_energy_kwh => *b = r.clone(),
            Some(_) => {}
            None => best.push(r.clone()),
        }
    }
    best.sort_by_key(|r| r.event.spec.date);
    best
}

/// Runs the full pipeline.
///
/// Prices are scaled by the currency multiplier before events are solved,
/// so event prices match the selected peaks.
///
/// # Errors
///
/// Input errors from [`rank_days`]. Degenerate events never fail the run.
pub fn run_batch(
    config: &StudyConfig,
    prices: &PriceSeries,
    energy: &EnergySeries,
    survey: &[SurveyRecord],
) -> Result<BatchResult, FlexError> {
    let ranking = rank_days(config, prices, energy)?;
    if ranking.ranked.is_empty() {
        warn!("no ranked candidate days, nothing to simulate");
    }

    let scaled = prices.scaled(config.selection.currency_multiplier);
    let model = ParticipationModel::new(survey, &config.selection.appliance);
    if model.base_population() == 0 {
        warn!(appliance = %config.selection.appliance, "no survey respondents for appliance");
    }
    let solver = EquilibriumSolver::new(config, &model, &scaled, energy);

    let specs = event_grid(config, &ranking.ranked);
    info!(events = specs.len(), "solving events");
    let events: Vec<EventRecord> = specs
        .iter()
        .map(|spec| {
            let event = solver.solve(spec);
            let grid = aggregate(&event, config.grid.households_in_scope);
            EventRecord { event, grid }
        })
        .collect();

    let best = best_per_day(&events);
    Ok(BatchResult {
        ranking,
        events,
        best_per_day: best,
    })
}
