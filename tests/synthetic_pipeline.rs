//! End-to-end runs on seeded synthetic inputs.

use dr_flex_sim::config::StudyConfig;
use dr_flex_sim::io::export::write_events_csv;
use dr_flex_sim::io::provider::{StudyInputs, load_inputs};
use dr_flex_sim::sim::batch::{BatchResult, run_batch};
use dr_flex_sim::sim::grid::BindingConstraint;
use dr_flex_sim::sim::kpi::BatchSummary;
use dr_flex_sim::synthetic::SyntheticStudy;

fn inputs(config: &StudyConfig, seed: u64) -> StudyInputs {
    let study = SyntheticStudy::new(seed);
    load_inputs(config, &study, &study, &study).unwrap()
}

fn run(config: &StudyConfig, seed: u64) -> BatchResult {
    let inputs = inputs(config, seed);
    run_batch(config, &inputs.prices, &inputs.energy, &inputs.survey).unwrap()
}

#[test]
fn hourly_load_is_resampled_to_quarter_hours() {
    let config = StudyConfig::dishwasher();
    let inputs = inputs(&config, 42);
    assert_eq!(inputs.prices.len(), 366 * 96);
    // The last hourly sample fills its own hour.
    assert_eq!(inputs.energy.len(), 366 * 96);
    assert_eq!(inputs.survey.len(), 400);
}

#[test]
fn ranked_days_are_contiguous_and_ordered() {
    let result = run(&StudyConfig::dishwasher(), 42);
    let ranked = &result.ranking.ranked;
    assert!(!ranked.is_empty());
    for (i, d) in ranked.iter().enumerate() {
        assert_eq!(d.rank, i + 1);
        assert!(result.ranking.candidate_days.contains(&d.date));
    }
    for pair in ranked.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.max_price_in_window > b.max_price_in_window
                || (a.max_price_in_window == b.max_price_in_window
                    && a.count_peaks_in_window >= b.count_peaks_in_window)
        );
    }
}

#[test]
fn event_grid_covers_top_days_by_offset_and_duration() {
    let config = StudyConfig::dishwasher();
    let result = run(&config, 42);
    let days = result.ranking.ranked.len().min(config.events.simulate_days);
    let per_day = config.events.pre_peak_offsets_hours.len() * config.events.durations_hours.len();
    assert_eq!(result.events.len(), days * per_day);
    assert_eq!(result.best_per_day.len(), days);

    // Day-major, then offset, then duration.
    let first = &result.events[0].event.spec;
    assert_eq!(first.pre_peak_offset_hours, config.events.pre_peak_offsets_hours[0]);
    assert_eq!(first.duration_hours, config.events.durations_hours[0]);
    let second = &result.events[1].event.spec;
    assert_eq!(second.duration_hours, config.events.durations_hours[1]);
}

#[test]
fn every_event_respects_its_bounds() {
    let config = StudyConfig::dishwasher();
    let result = run(&config, 42);
    let cap = config.compensation.population_participation_cap;
    let global = config.compensation.global_max_compensation_pct;

    let mut solved = 0;
    for r in &result.events {
        let (e, g) = (&r.event, &r.grid);
        if e.is_degenerate() {
            assert_eq!(g.binding_constraint, BindingConstraint::NoData);
            continue;
        }
        solved += 1;
        assert!(e.offer_pct >= 0.0);
        assert!(e.offer_pct <= global.min(e.event_max_compensation_pct) + 1e-9);
        assert!(e.capped_participation_rate <= cap);
        assert!(e.capped_participation_rate <= e.raw_participation_rate + 1e-12);
        assert!(e.compensation_per_household <= e.event_max_compensation + 1e-9);
        assert!(e.iterations <= config.solver.max_iterations);
        assert_eq!(
            g.shiftable_energy_kwh,
            g.window_limit_kwh.min(g.household_limit_kwh)
        );
    }
    assert!(solved > 0);
}

#[test]
fn best_per_day_keeps_the_largest_shift() {
    let result = run(&StudyConfig::dishwasher(), 42);
    for best in &result.best_per_day {
        let date = best.event.spec.date;
        let max = result
            .events
            .iter()
            .filter(|r| r.event.spec.date == date)
            .map(|r| r.grid.shiftable_energy_kwh)
            .fold(f64::MIN, f64::max);
        assert_eq!(best.grid.shiftable_energy_kwh, max);
    }
}

#[test]
fn identical_inputs_give_identical_results() {
    let config = StudyConfig::dishwasher();
    let a = run(&config, 7);
    let b = run(&config, 7);
    assert_eq!(a, b);

    let mut csv_a = Vec::new();
    let mut csv_b = Vec::new();
    write_events_csv(&a.events, &mut csv_a).unwrap();
    write_events_csv(&b.events, &mut csv_b).unwrap();
    assert_eq!(csv_a, csv_b);
}

#[test]
fn summary_matches_batch() {
    let result = run(&StudyConfig::washing_machine(), 3);
    let summary = BatchSummary::from_result(&result);
    assert_eq!(summary.events, result.events.len());
    assert_eq!(summary.ranked_days, result.ranking.ranked.len());
    assert_eq!(summary.peak_count, 150);
    assert!(summary.converged_events + summary.degenerate_events <= summary.events);
}
