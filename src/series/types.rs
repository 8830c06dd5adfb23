//! Time series of market prices, appliance power and per-interval energy.
//!
//! All series are chronological, carry UTC timestamps and never contain two
//! points with the same timestamp. Constructors sort and keep the first of
//! any duplicates.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Market price for one clearing interval (currency per kWh).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price_per_kwh: f64,
}

/// Appliance power at one instant (kW).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadPoint {
    pub timestamp: DateTime<Utc>,
    pub power_kw: f64,
}

/// Appliance energy consumed within one interval starting at `timestamp` (kWh).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyPoint {
    pub timestamp: DateTime<Utc>,
    pub energy_kwh: f64,
}

fn sort_dedup<T>(mut points: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    points.sort_by_key(|p| key(p));
    points.dedup_by(|b, a| key(a) == key(b));
    points
}

fn half_open<T: Copy>(
    points: &[T],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    key: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let from = points.partition_point(|p| key(p) < start);
    let to = points.partition_point(|p| key(p) < end);
    if from >= to {
        return Vec::new();
    }
    points[from..to].to_vec()
}

/// Chronological market price series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, sorting by timestamp and dropping repeated timestamps.
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self {
            points: sort_dedup(points, |p| p.timestamp),
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns a copy with every price multiplied by `multiplier`.
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| PricePoint {
                    timestamp: p.timestamp,
                    price_per_kwh: p.price_per_kwh * multiplier,
                })
                .collect(),
        }
    }

    /// Points with `start <= timestamp < end`.
    pub fn slice(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<PricePoint> {
        half_open(&self.points, start, end, |p| p.timestamp)
    }

    /// Restricts the series to one calendar year (UTC).
    pub fn year(&self, year: i32) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| p.timestamp.year() == year)
                .copied()
                .collect(),
        }
    }
}

/// Chronological appliance power series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadSeries {
    points: Vec<LoadPoint>,
}

impl LoadSeries {
    /// Builds a series, sorting by timestamp and dropping repeated timestamps.
    pub fn new(points: Vec<LoadPoint>) -> Self {
        Self {
            points: sort_dedup(points, |p| p.timestamp),
        }
    }

    pub fn points(&self) -> &[LoadPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Resamples to a finer cadence by forward fill.
    ///
    /// Each source value is held until the next source timestamp. The last
    /// point is held for one source step (inferred from the first two
    /// points, or `interval` when there is only one point). Sources already
    /// at or below `interval` cadence are returned unchanged.
    pub fn resample_ffill(&self, interval: Duration) -> Self {
        if self.points.len() < 2 || interval <= Duration::zero() {
            return self.clone();
        }
        let source_step = self.points[1].timestamp - self.points[0].timestamp;
        if source_step <= interval {
            return self.clone();
        }

        let mut out = Vec::with_capacity(self.points.len() * 4);
        for (i, p) in self.points.iter().enumerate() {
            let until = self
                .points
                .get(i + 1)
                .map_or(p.timestamp + source_step, |next| next.timestamp);
            let mut t = p.timestamp;
            while t < until {
                out.push(LoadPoint {
                    timestamp: t,
                    power_kw: p.power_kw,
                });
                t += interval;
            }
        }
        Self { points: out }
    }

    /// Converts power to energy per interval (`power_kw × interval hours`).
    pub fn to_energy(&self, interval: Duration) -> EnergySeries {
        let hours = interval.num_seconds() as f64 / 3600.0;
        EnergySeries {
            points: self
                .points
                .iter()
                .map(|p| EnergyPoint {
                    timestamp: p.timestamp,
                    energy_kwh: p.power_kw * hours,
                })
                .collect(),
        }
    }
}

/// Chronological per-interval energy series for one appliance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergySeries {
    points: Vec<EnergyPoint>,
}

impl EnergySeries {
    /// Builds a series, sorting by timestamp and dropping repeated timestamps.
    pub fn new(points: Vec<EnergyPoint>) -> Self {
        Self {
            points: sort_dedup(points, |p| p.timestamp),
        }
    }

    pub fn points(&self) -> &[EnergyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points with `start <= timestamp < end`.
    pub fn slice(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<EnergyPoint> {
        half_open(&self.points, start, end, |p| p.timestamp)
    }

    /// Groups points by UTC calendar day, in date order.
    pub fn by_day(&self) -> BTreeMap<NaiveDate, Vec<EnergyPoint>> {
        let mut days: BTreeMap<NaiveDate, Vec<EnergyPoint>> = BTreeMap::new();
        for p in &self.points {
            days.entry(p.timestamp.date_naive()).or_default().push(*p);
        }
        days
    }

    /// Keeps only the given days.
    pub fn restrict_to_days(&self, days: &BTreeSet<NaiveDate>) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| days.contains(&p.timestamp.date_naive()))
                .copied()
                .collect(),
        }
    }
}

/// One interval present in both the price and the energy slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedSlot {
    pub timestamp: DateTime<Utc>,
    pub energy_kwh: f64,
    pub price_per_kwh: f64,
}

/// Inner join of two chronological slices on timestamp.
///
/// Slots present in only one input, or with a non-finite price, are dropped,
/// never interpolated.
pub fn align(energy: &[EnergyPoint], prices: &[PricePoint]) -> Vec<AlignedSlot> {
    let mut out = Vec::with_capacity(energy.len().min(prices.len()));
    let (mut i, mut j) = (0, 0);
    while i < energy.len() && j < prices.len() {
        let (e, p) = (&energy[i], &prices[j]);
        match e.timestamp.cmp(&p.timestamp) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                if p.price_per_kwh.is_finite() {
                    out.push(AlignedSlot {
                        timestamp: e.timestamp,
                        energy_kwh: e.energy_kwh,
                        price_per_kwh: p.price_per_kwh,
                    });
                }
                i += 1;
                j += 1;
            }
        }
    }
    out
}
