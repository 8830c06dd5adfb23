//! Demand-response candidate days and their ranking.
//!
//! A day is a candidate when at least one of its price peaks falls inside
//! that day's energy window. Candidates are scored from the in-window
//! peaks only and ranked by the highest in-window price.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::peaks::PeakPeriod;
use super::window::DayWindow;

/// Per-day energy windows as produced by the window finder.
pub type WindowMap = BTreeMap<NaiveDate, Option<DayWindow>>;

/// A candidate day with its in-window price statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDay {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub date: NaiveDate,
    pub max_price_in_window: f64,
    pub avg_price_in_window: f64,
    pub count_peaks_in_window: usize,
    pub sum_prices_in_window: f64,
    pub window_duration_hours: f64,
    pub window_energy_sum: f64,
    pub window_energy_pct: f64,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    /// Earliest in-window peak priced at `max_price_in_window`.
    pub reference_peak: DateTime<Utc>,
}

fn peaks_by_day(peaks: &[PeakPeriod]) -> BTreeMap<NaiveDate, Vec<&PeakPeriod>> {
    let mut days: BTreeMap<NaiveDate, Vec<&PeakPeriod>> = BTreeMap::new();
    for p in peaks {
        days.entry(p.date()).or_default().push(p);
    }
    for list in days.values_mut() {
        list.sort_by_key(|p| p.timestamp);
    }
    days
}

/// Dates whose window contains at least one peak, ascending.
pub fn identify_candidate_days(peaks: &[PeakPeriod], windows: &WindowMap) -> Vec<NaiveDate> {
    peaks_by_day(peaks)
        .into_iter()
        .filter(|(date, day_peaks)| match windows.get(date) {
            Some(Some(w)) => day_peaks.iter().any(|p| w.contains_time(p.time_of_day())),
            _ => false,
        })
        .map(|(date, _)| date)
        .collect()
}

/// Scores and ranks the candidate days.
///
/// Order: `max_price_in_window` descending, then `count_peaks_in_window`
/// descending, then date ascending. Days without an in-window peak are
/// left out.
pub fn rank_candidate_days(peaks: &[PeakPeriod], windows: &WindowMap) -> Vec<RankedDay> {
    let mut ranked = Vec::new();
    for (date, day_peaks) in peaks_by_day(peaks) {
        let Some(Some(window)) = windows.get(&date) else {
            continue;
        };
        if let Some(day) = score_day(date, window, &day_peaks) {
            ranked.push(day);
        }
    }

    ranked.sort_by(|a, b| {
        b.max_price_in_window
            .total_cmp(&a.max_price_in_window)
            .then_with(|| b.count_peaks_in_window.cmp(&a.count_peaks_in_window))
            .then_with(|| a.date.cmp(&b.date))
    });
    for (i, day) in ranked.iter_mut().enumerate() {
        day.rank = i + 1;
    }
    ranked
}

fn score_day(date: NaiveDate, window: &DayWindow, day_peaks: &[&PeakPeriod]) -> Option<RankedDay> {
    let mut count = 0;
    let mut sum = 0.0;
    let mut max: Option<&PeakPeriod> = None;
    for p in day_peaks {
        if !window.contains_time(p.time_of_day()) {
            continue;
        }
        count += 1;
        sum += p.price_per_kwh;
        // Strictly greater keeps the earliest peak among equal prices.
        let higher = max.is_none_or(|m| p.price_per_kwh.total_cmp(&m.price_per_kwh) == Ordering::Greater);
        if higher {
            max = Some(p);
        }
    }
    let reference = max?;

    Some(RankedDay {
        rank: 0,
        date,
        max_price_in_window: reference.price_per_kwh,
        avg_price_in_window: sum / count as f64,
        count_peaks_in_window: count,
        sum_prices_in_window: sum,
        window_duration_hours: window.span_hours(),
        window_energy_sum: window.energy_sum,
        window_energy_pct: window.energy_pct,
        window_start: window.start_time,
        window_end: window.end_time,
        reference_peak: reference.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn peak(day: u32, h: u32, price: f64) -> PeakPeriod {
        let ts = Utc.with_ymd_and_hms(2024, 5, day, h, 0, 0).unwrap();
        PeakPeriod {
            timestamp: ts,
            price_per_kwh: price,
            weekday: ts.weekday(),
            hour: ts.hour(),
        }
    }

    fn window(day: u32, start: u32, end: u32) -> (NaiveDate, Option<DayWindow>) {
        let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        (
            date,
            Some(DayWindow {
                date,
                start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
                duration_hours: if end == 0 { 24.0 - start as f64 } else { (end - start) as f64 },
                energy_sum: 2.0,
                energy_pct: 72.0,
            }),
        )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn candidate_needs_a_peak_inside_the_window() {
        let windows: WindowMap = [window(1, 10, 14), window(2, 10, 14), window(3, 18, 0)]
            .into_iter()
            .collect();
        let peaks = vec![peak(1, 12, 0.5), peak(2, 14, 0.9), peak(3, 23, 0.2), peak(4, 12, 1.0)];
        assert_eq!(identify_candidate_days(&peaks, &windows), vec![date(1), date(3)]);
    }

    #[test]
    fn day_without_window_is_never_a_candidate() {
        let windows: WindowMap = [(date(1), None)].into_iter().collect();
        let peaks = vec![peak(1, 12, 0.5)];
        assert!(identify_candidate_days(&peaks, &windows).is_empty());
        assert!(rank_candidate_days(&peaks, &windows).is_empty());
    }

    #[test]
    fn ranking_orders_by_max_then_count_then_date() {
        let windows: WindowMap = [window(1, 8, 20), window(2, 8, 20), window(3, 8, 20), window(4, 8, 20)]
            .into_iter()
            .collect();
        let peaks = vec![
            peak(1, 9, 0.8),
            peak(2, 9, 0.8),
            peak(2, 10, 0.3),
            peak(3, 9, 0.9),
            peak(4, 9, 0.8),
            // Outside the window, ignored for scoring.
            peak(4, 21, 5.0),
        ];
        let ranked = rank_candidate_days(&peaks, &windows);
        let order: Vec<_> = ranked.iter().map(|d| d.date).collect();
        assert_eq!(order, vec![date(3), date(2), date(1), date(4)]);
        assert_eq!(ranked.iter().map(|d| d.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

        let day2 = &ranked[1];
        assert_eq!(day2.count_peaks_in_window, 2);
        assert!((day2.sum_prices_in_window - 1.1).abs() < 1e-12);
        assert!((day2.avg_price_in_window - 0.55).abs() < 1e-12);
        assert_eq!(ranked[3].max_price_in_window, 0.8);
    }

    #[test]
    fn reference_peak_is_earliest_at_max_price() {
        let windows: WindowMap = [window(1, 0, 0)].into_iter().collect();
        let peaks = vec![peak(1, 15, 0.7), peak(1, 9, 0.7), peak(1, 3, 0.4)];
        let ranked = rank_candidate_days(&peaks, &windows);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].reference_peak.hour(), 9);
        assert_eq!(ranked[0].count_peaks_in_window, 3);
        assert_eq!(ranked[0].window_duration_hours, 24.0);
    }

    #[test]
    fn window_to_midnight_counts_late_peaks() {
        let windows: WindowMap = [window(1, 18, 0)].into_iter().collect();
        let peaks = vec![peak(1, 17, 0.9), peak(1, 19, 0.5)];
        let ranked = rank_candidate_days(&peaks, &windows);
        assert_eq!(ranked[0].max_price_in_window, 0.5);
        assert_eq!(ranked[0].window_duration_hours, 6.0);
    }
}
