//! Seeded synthetic study data.
//!
//! Generates a year of quarter-hourly prices with evening spikes, an hourly
//! appliance load profile and a survey panel answered in raw text. The same
//! seed always yields the same data.

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::FlexError;
use crate::io::provider::{LoadProvider, PriceProvider, SurveyProvider, year_bounds};
use crate::series::{LoadPoint, LoadSeries, PricePoint, PriceSeries};
use crate::survey::SurveyRecord;
use crate::survey::normalize::{DURATION_ANSWERS, record_from_answers};

/// Seed offsets keep the three generators uncorrelated.
const LOAD_SEED_OFFSET: u64 = 17;
const SURVEY_SEED_OFFSET: u64 = 43;

/// Relative appliance use per UTC hour.
const HOURLY_PROFILE: [f64; 24] = [
    0.20, 0.10, 0.05, 0.05, 0.05, 0.10, 0.30, 0.50, 0.60, 0.50, 0.40, 0.50, //
    0.90, 1.00, 0.70, 0.50, 0.50, 0.80, 1.60, 2.20, 2.00, 1.50, 0.90, 0.40,
];

const INCENTIVE_ANSWERS: &[&str] = &[
    "Ja, fixe Pauschale",
    "Ja, + 5%",
    "Ja, + 10%",
    "Ja, + 20%",
    "30",
    "Ja, + 50 Prozent",
    "Nein",
    "weiss nicht",
];

/// Synthetic data source for demos and tests.
#[derive(Debug, Clone)]
pub struct SyntheticStudy {
    seed: u64,
    respondents: usize,
    /// Peak aggregate appliance power (kW).
    peak_power_kw: f64,
}

impl SyntheticStudy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            respondents: 400,
            peak_power_kw: 60_000.0,
        }
    }

    pub fn with_respondents(mut self, respondents: usize) -> Self {
        self.respondents = respondents;
        self
    }

    fn price_at(rng: &mut StdRng, t: DateTime<Utc>) -> f64 {
        let hour = f64::from(t.hour()) + f64::from(t.minute()) / 60.0;
        let daily = (2.0 * std::f64::consts::PI * (hour - 6.0) / 24.0).sin();
        let base = 0.08 + 0.03 * daily + rng.random_range(0.0..0.02);
        // Spikes cluster in the evening ramp.
        let spike_prob = if (16..22).contains(&t.hour()) { 0.02 } else { 0.002 };
        if rng.random_bool(spike_prob) {
            base + rng.random_range(0.3..1.5)
        } else {
            base
        }
    }
}

impl PriceProvider for SyntheticStudy {
    fn price_series(&self, year: i32) -> Result<PriceSeries, FlexError> {
        let (start, end) = year_bounds(year)
            .ok_or_else(|| FlexError::EmptySeries(format!("year {year}")))?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut points = Vec::new();
        let mut t = start;
        while t < end {
            points.push(PricePoint {
                timestamp: t,
                price_per_kwh: Self::price_at(&mut rng, t),
            });
            t += Duration::minutes(15);
        }
        Ok(PriceSeries::new(points))
    }
}

impl LoadProvider for SyntheticStudy {
    fn load_series(
        &self,
        _appliance: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<LoadSeries, FlexError> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(LOAD_SEED_OFFSET));
        let peak = HOURLY_PROFILE.iter().copied().fold(0.0, f64::max);
        let mut points = Vec::new();
        let mut t = start;
        while t < end {
            let shape = HOURLY_PROFILE[t.hour() as usize] / peak;
            let noise = rng.random_range(0.9..1.1);
            points.push(LoadPoint {
                timestamp: t,
                power_kw: self.peak_power_kw * shape * noise,
            });
            t += Duration::hours(1);
        }
        Ok(LoadSeries::new(points))
    }
}

impl SurveyProvider for SyntheticStudy {
    fn survey_table(&self, appliance: &str) -> Result<Vec<SurveyRecord>, FlexError> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(SURVEY_SEED_OFFSET));
        let records = (0..self.respondents)
            .map(|i| {
                let (duration, _) = DURATION_ANSWERS[rng.random_range(0..DURATION_ANSWERS.len())];
                let incentive = INCENTIVE_ANSWERS[rng.random_range(0..INCENTIVE_ANSWERS.len())];
                let unanswered = rng.random_bool(0.05);
                record_from_answers(
                    &format!("R{i:04}"),
                    appliance,
                    (!unanswered).then_some(duration),
                    Some(incentive),
                )
            })
            .collect();
        Ok(records)
    }
}
