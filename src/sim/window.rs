//! Shortest per-day windows covering a share of appliance energy.
//!
//! For each calendar day the finder returns the shortest contiguous run of
//! intervals whose energy reaches `threshold_pct` of the day's total. Load
//! values are non-negative, so prefix sums are monotonic and a single
//! two-pointer pass finds the minimum in linear time.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use tracing::warn;

use crate::error::FlexError;
use crate::series::{EnergyPoint, EnergySeries};

/// The shortest time-of-day span covering the target share of one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Exclusive end. `00:00` with a non-midnight start means "to day end".
    pub end_time: NaiveTime,
    pub duration_hours: f64,
    /// Energy inside the window (kWh).
    pub energy_sum: f64,
    /// Share of the day's energy inside the window (0..=100).
    pub energy_pct: f64,
}

impl DayWindow {
    /// Whether time-of-day `t` falls inside the window.
    ///
    /// * `start < end`: `start <= t < end`
    /// * `end == 00:00`, `start != 00:00`: `t >= start`
    /// * `start == end == 00:00`: the whole day
    pub fn contains_time(&self, t: NaiveTime) -> bool {
        let (start, end) = (self.start_time, self.end_time);
        if start < end {
            start <= t && t < end
        } else if end == NaiveTime::MIN && start != NaiveTime::MIN {
            t >= start
        } else {
            start == NaiveTime::MIN && end == NaiveTime::MIN
        }
    }

    /// Wall-clock length from `start_time` to `end_time` in hours.
    ///
    /// A midnight end counts as 24:00; a window from midnight to midnight
    /// spans the full day.
    pub fn span_hours(&self) -> f64 {
        let start = hours_of(self.start_time);
        let end = hours_of(self.end_time);
        if self.start_time == NaiveTime::MIN && self.end_time == NaiveTime::MIN {
            24.0
        } else if end > start {
            end - start
        } else {
            24.0 - start + end
        }
    }
}

fn hours_of(t: NaiveTime) -> f64 {
    f64::from(t.num_seconds_from_midnight()) / 3600.0
}

/// Finds the window for every day in `energy`.
///
/// `interval` is the cadence assumed for days with a single point.
///
/// # Errors
///
/// Returns [`FlexError::UnreachableThreshold`] if a day with positive energy
/// has no span reaching its target, which only happens for thresholds above
/// 100%.
pub fn find_windows(
    energy: &EnergySeries,
    threshold_pct: f64,
    interval: Duration,
) -> Result<BTreeMap<NaiveDate, Option<DayWindow>>, FlexError> {
    let mut windows = BTreeMap::new();
    for (date, points) in energy.by_day() {
        let window = find_day_window(date, &points, threshold_pct, interval)?;
        if window.is_none() {
            warn!(%date, "no energy on day, skipping window");
        }
        windows.insert(date, window);
    }
    Ok(windows)
}

/// Finds the window for one day's chronological points.
///
/// Returns `Ok(None)` when the day's total energy is not positive. Among
/// spans of equal length the earliest wins.
///
/// # Errors
///
/// See [`find_windows`].
pub fn find_day_window(
    date: NaiveDate,
    points: &[EnergyPoint],
    threshold_pct: f64,
    interval: Duration,
) -> Result<Option<DayWindow>, FlexError> {
    let total: f64 = points.iter().map(|p| p.energy_kwh).sum();
    if !(total > 0.0) {
        return Ok(None);
    }
    let target = total * (threshold_pct / 100.0);

    let mut best: Option<(usize, usize)> = None;
    let mut left = 0;
    let mut running = 0.0;
    for right in 0..points.len() {
        running += points[right].energy_kwh;
        while left < right && running - points[left].energy_kwh >= target {
            running -= points[left].energy_kwh;
            left += 1;
        }
        if running >= target {
            let shorter = best.is_none_or(|(l, r)| right - left < r - l);
            if shorter {
                best = Some((left, right));
            }
        }
    }

    let Some((l, r)) = best else {
        return Err(FlexError::UnreachableThreshold {
            date,
            threshold_pct,
        });
    };

    let step = match points {
        [first, second, ..] => second.timestamp - first.timestamp,
        _ => interval,
    };
    let start = points[l].timestamp;
    let end = points[r].timestamp + step;
    let end_time = if end.date_naive() != start.date_naive() {
        NaiveTime::MIN
    } else {
        end.time()
    };
    let slots = (r - l + 1) as i32;
    let energy_sum: f64 = points[l..=r].iter().map(|p| p.energy_kwh).sum();

    Ok(Some(DayWindow {
        date,
        start_time: start.time(),
        end_time,
        duration_hours: (step * slots).num_seconds() as f64 / 3600.0,
        energy_sum,
        energy_pct: 100.0 * energy_sum / total,
    }))
}
