//! Hand-built single-day scenario through the full batch pipeline.

mod common;

use chrono::{NaiveTime, Timelike};

use dr_flex_sim::sim::batch::run_batch;
use dr_flex_sim::sim::grid::BindingConstraint;
use dr_flex_sim::sim::kpi::BatchSummary;

#[test]
fn single_day_is_ranked_with_evening_window() {
    let config = common::one_day_config();
    let result = run_batch(
        &config,
        &common::spiked_prices(),
        &common::evening_energy(),
        &common::willing_panel(10),
    )
    .unwrap();

    let ranking = &result.ranking;
    assert_eq!(ranking.peaks.len(), 2);
    assert_eq!(ranking.candidate_days, vec![common::study_day()]);
    assert_eq!(ranking.ranked.len(), 1);

    let day = &ranking.ranked[0];
    assert_eq!(day.rank, 1);
    assert_eq!(day.count_peaks_in_window, 2);
    assert!((day.max_price_in_window - 0.9).abs() < 1e-12);
    assert!((day.sum_prices_in_window - 1.5).abs() < 1e-12);
    assert_eq!(day.reference_peak, common::slot(72));
    assert!(day.window_start <= NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    assert!(day.window_energy_pct >= 70.0);
}

#[test]
fn one_and_a_half_hour_event_hits_the_event_cap() {
    let config = common::one_day_config();
    let result = run_batch(
        &config,
        &common::spiked_prices(),
        &common::evening_energy(),
        &common::willing_panel(10),
    )
    .unwrap();
    assert_eq!(result.events.len(), 2);

    let short = &result.events[0];
    let e = &short.event;
    assert!(e.error_message.is_none());
    assert_eq!(e.event_start.hour(), 17);
    assert_eq!(e.slots, 6);
    assert!((e.window_energy_kwh - 18.0).abs() < 1e-9);
    // (4 × 0.10 + 0.90 + 0.60) / 6
    let avg = 1.9 / 6.0;
    assert!((e.avg_price_window.unwrap() - avg).abs() < 1e-12);
    assert!((e.avg_price_paid.unwrap() - avg).abs() < 1e-12);
    assert!((e.event_max_compensation - avg * 1.44).abs() < 1e-9);

    // The market supports far more than the event cap, so the offer
    // settles just below the cap.
    assert!(e.converged);
    assert!(e.offer_pct <= e.event_max_compensation_pct + 1e-12);
    assert!(e.event_max_compensation_pct - e.offer_pct <= config.solver.tolerance_pct * 2.0);
    assert_eq!(e.raw_participation_rate, 1.0);
    assert_eq!(e.capped_participation_rate, 0.629);

    let g = &short.grid;
    assert_eq!(g.binding_constraint, BindingConstraint::WindowLimit);
    assert!((g.shiftable_energy_kwh - 18.0 * 0.629).abs() < 1e-9);
}

#[test]
fn longer_event_pays_the_same_capped_hours() {
    let config = common::one_day_config();
    let result = run_batch(
        &config,
        &common::spiked_prices(),
        &common::evening_energy(),
        &common::willing_panel(10),
    )
    .unwrap();

    let (short, long) = (&result.events[0].event, &result.events[1].event);
    assert_eq!(long.slots, 12);
    assert!((long.window_energy_kwh - 36.0).abs() < 1e-9);
    assert_eq!(long.hours_paid_cap, short.hours_paid_cap);
    assert_eq!(long.avg_price_paid, short.avg_price_paid);

    // Same date: the longer event shifts more and wins the day.
    assert_eq!(result.best_per_day.len(), 1);
    assert_eq!(result.best_per_day[0].event.spec.duration_hours, 3.0);
}

#[test]
fn empty_panel_shifts_nothing() {
    let config = common::one_day_config();
    let result = run_batch(
        &config,
        &common::spiked_prices(),
        &common::evening_energy(),
        &[],
    )
    .unwrap();

    for r in &result.events {
        assert!(r.event.error_message.is_none());
        assert_eq!(r.event.raw_participation_rate, 0.0);
        assert_eq!(r.event.offer_pct, 0.0);
        assert_eq!(r.grid.shiftable_energy_kwh, 0.0);
        assert_eq!(r.grid.binding_constraint, BindingConstraint::WindowLimit);
    }
    let summary = BatchSummary::from_result(&result);
    assert_eq!(summary.best_shiftable_energy_kwh, 0.0);
}

#[test]
fn event_outside_loaded_data_is_degenerate_not_an_error() {
    let mut config = common::one_day_config();
    // 20 h before the 18:00 peak starts on the previous day, where no data exist.
    config.events.pre_peak_offsets_hours = vec![20.0];
    config.events.durations_hours = vec![1.5];
    let result = run_batch(
        &config,
        &common::spiked_prices(),
        &common::evening_energy(),
        &common::willing_panel(10),
    )
    .unwrap();

    let r = &result.events[0];
    assert_eq!(
        r.event.error_message.as_deref(),
        Some("No common 15-min slots in window")
    );
    assert_eq!(r.grid.binding_constraint, BindingConstraint::NoData);
    assert_eq!(BatchSummary::from_result(&result).degenerate_events, 1);
}
