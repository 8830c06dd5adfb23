//! Selection of the highest-priced market intervals.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};

use crate::error::FlexError;
use crate::series::PriceSeries;

/// A price interval selected as one of the top-N by price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakPeriod {
    pub timestamp: DateTime<Utc>,
    /// Price after the currency multiplier (currency per kWh).
    pub price_per_kwh: f64,
    pub weekday: Weekday,
    /// Hour of day (0..24).
    pub hour: u32,
}

impl PeakPeriod {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// English weekday name, e.g. `"Monday"`.
    pub fn weekday_name(&self) -> &'static str {
        match self.weekday {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }
}

/// Selects the `n` highest-priced intervals.
///
/// Prices are multiplied by `multiplier` (if given) before ranking. Equal
/// prices keep chronological order. Non-finite prices never qualify.
///
/// # Errors
///
/// * [`FlexError::EmptySeries`] if the series has no points
/// * [`FlexError::MissingColumn`] if no point carries a finite price
pub fn select_peaks(
    series: &PriceSeries,
    n: usize,
    multiplier: Option<f64>,
) -> Result<Vec<PeakPeriod>, FlexError> {
    if series.is_empty() {
        return Err(FlexError::EmptySeries("prices".into()));
    }
    let factor = multiplier.unwrap_or(1.0);

    let mut priced: Vec<(DateTime<Utc>, f64)> = series
        .points()
        .iter()
        .map(|p| (p.timestamp, p.price_per_kwh * factor))
        .filter(|(_, price)| price.is_finite())
        .collect();
    if priced.is_empty() {
        return Err(FlexError::missing_column("price", "price series"));
    }

    // Stable: equal prices stay in chronological order.
    priced.sort_by(|a, b| b.1.total_cmp(&a.1));
    priced.truncate(n);

    Ok(priced
        .into_iter()
        .map(|(timestamp, price_per_kwh)| PeakPeriod {
            timestamp,
            price_per_kwh,
            weekday: timestamp.weekday(),
            hour: timestamp.hour(),
        })
        .collect())
}

/// Summary statistics over a set of selected peaks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakSummary {
    pub count: usize,
    pub mean_price_per_kwh: f64,
    pub max_price_per_kwh: f64,
    pub min_price_per_kwh: f64,
}

impl PeakSummary {
    pub fn from_peaks(peaks: &[PeakPeriod]) -> Self {
        if peaks.is_empty() {
            return Self {
                count: 0,
                mean_price_per_kwh: 0.0,
                max_price_per_kwh: 0.0,
                min_price_per_kwh: 0.0,
            };
        }
        let sum: f64 = peaks.iter().map(|p| p.price_per_kwh).sum();
        Self {
            count: peaks.len(),
            mean_price_per_kwh: sum / peaks.len() as f64,
            max_price_per_kwh: peaks
                .iter()
                .map(|p| p.price_per_kwh)
                .fold(f64::NEG_INFINITY, f64::max),
            min_price_per_kwh: peaks
                .iter()
                .map(|p| p.price_per_kwh)
                .fold(f64::INFINITY, f64::min),
        }
    }
}
