//! Conversion of naive local timestamps to UTC.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Localizes a chronological run of naive wall-clock timestamps.
///
/// Ambiguous times (the repeated hour when clocks go back) are resolved by
/// sequence: the first occurrence takes the earlier instant, a repeat takes
/// the later one. Times inside the spring-forward gap are shifted forward
/// by one hour. The output has the same length and order as the input.
pub fn localize_sequence(tz: Tz, naive: &[NaiveDateTime]) -> Vec<DateTime<Utc>> {
    let mut out: Vec<DateTime<Utc>> = Vec::with_capacity(naive.len());
    for n in naive {
        let utc = match tz.from_local_datetime(n) {
            LocalResult::Single(t) => t.with_timezone(&Utc),
            LocalResult::Ambiguous(early, late) => {
                let early = early.with_timezone(&Utc);
                match out.last() {
                    Some(prev) if *prev >= early => late.with_timezone(&Utc),
                    _ => early,
                }
            }
            LocalResult::None => shift_forward(tz, *n),
        };
        out.push(utc);
    }
    out
}

fn shift_forward(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    let shifted = naive + Duration::hours(1);
    match tz.from_local_datetime(&shifted) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.with_timezone(&Utc),
        // No zone has two adjacent gaps; read the wall clock as UTC.
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

/// Parses a timestamp cell.
///
/// RFC 3339 values carry their own offset. Naive values
/// (`%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%d %H:%M`) are returned
/// as wall-clock times for [`localize_sequence`].
pub fn parse_timestamp(raw: &str) -> Option<TimestampCell> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(TimestampCell::Absolute(t.with_timezone(&Utc)));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(TimestampCell::Local)
}

/// A parsed timestamp cell, either absolute or wall-clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampCell {
    Absolute(DateTime<Utc>),
    Local(NaiveDateTime),
}

/// Resolves a column of parsed cells to UTC.
///
/// Runs of wall-clock cells are localized together so DST folds resolve by
/// sequence.
pub fn resolve_cells(tz: Tz, cells: &[TimestampCell]) -> Vec<DateTime<Utc>> {
    let mut out = Vec::with_capacity(cells.len());
    let mut pending: Vec<NaiveDateTime> = Vec::new();
    for cell in cells {
        match cell {
            TimestampCell::Local(n) => pending.push(*n),
            TimestampCell::Absolute(t) => {
                if !pending.is_empty() {
                    out.extend(localize_sequence(tz, &pending));
                    pending.clear();
                }
                out.push(*t);
            }
        }
    }
    if !pending.is_empty() {
        out.extend(localize_sequence(tz, &pending));
    }
    out
}
