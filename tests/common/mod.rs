//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use dr_flex_sim::config::StudyConfig;
use dr_flex_sim::series::{EnergyPoint, EnergySeries, PricePoint, PriceSeries};
use dr_flex_sim::survey::{IncentiveChoice, SurveyRecord};

/// Study day used by the hand-built scenarios (a Tuesday).
pub fn study_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap_or_default()
}

/// Midnight UTC of [`study_day`].
pub fn day_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
}

/// Quarter-hour timestamp `i` slots after [`day_start`].
pub fn slot(i: usize) -> DateTime<Utc> {
    day_start() + Duration::minutes(15 * i as i64)
}

/// Flat 0.10 prices with 0.90 at 18:00 and 0.60 at 18:15.
pub fn spiked_prices() -> PriceSeries {
    PriceSeries::new(
        (0..96)
            .map(|i| PricePoint {
                timestamp: slot(i),
                price_per_kwh: match i {
                    72 => 0.9,
                    73 => 0.6,
                    _ => 0.1,
                },
            })
            .collect(),
    )
}

/// 3 kWh per slot between 16:00 and 21:00, 0.5 kWh otherwise.
pub fn evening_energy() -> EnergySeries {
    EnergySeries::new(
        (0..96)
            .map(|i| EnergyPoint {
                timestamp: slot(i),
                energy_kwh: if (64..84).contains(&i) { 3.0 } else { 0.5 },
            })
            .collect(),
    )
}

/// `n` respondents who accept any event up to 4.5 h without incentive.
pub fn willing_panel(n: usize) -> Vec<SurveyRecord> {
    (0..n)
        .map(|i| {
            SurveyRecord::new(
                format!("r{i}"),
                "dishwasher",
                Some(4.5),
                IncentiveChoice::UnconditionalYes,
                None,
            )
        })
        .collect()
}

/// Dishwasher study narrowed to one day: two peaks, one offset, two durations.
pub fn one_day_config() -> StudyConfig {
    let mut config = StudyConfig::dishwasher();
    config.selection.top_n = 2;
    config.events.simulate_days = 1;
    config.events.pre_peak_offsets_hours = vec![1.0];
    config.events.durations_hours = vec![1.5, 3.0];
    config
}
