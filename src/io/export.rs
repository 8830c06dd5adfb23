//! CSV export of ranked days and solved events.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::batch::EventRecord;
use crate::sim::ranking::RankedDay;

/// Column header for event tables (detailed and best-per-day).
const EVENT_HEADER: &str = "event_date,rank,reference_peak_utc,event_start_utc,\
                            pre_peak_offset_h,event_duration_h,slots,window_energy_kwh,\
                            avg_price_window,avg_price_paid,hours_paid_cap,energy_cap_kwh,\
                            monthly_energy_kwh,monthly_cost,event_max_comp,event_max_comp_pct,\
                            offer_pct,raw_participation,capped_participation,\
                            shifted_energy_kwh,market_value,unit_payout_per_kwh,\
                            comp_per_household,households_in_scope,window_limit_kwh,\
                            household_limit_kwh,shiftable_energy_kwh,binding_constraint,\
                            total_compensation,iterations,converged,error_message";

/// Column header for the ranked-day table.
const RANKING_HEADER: &str = "rank,date,max_price_in_window,avg_price_in_window,\
                              count_peaks_in_window,sum_prices_in_window,\
                              window_duration_h,window_energy_sum,window_energy_pct,\
                              window_start,window_end,reference_peak_utc";

const TS_FORMAT: &str = "%Y-%m-%d %H:%M";

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_default()
}

/// Exports event records to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_events_csv(records: &[EventRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_events_csv(records, io::BufWriter::new(file))
}

/// Writes event records as CSV to any writer.
///
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_events_csv(records: &[EventRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(EVENT_HEADER.split(',').map(str::trim))?;

    for r in records {
        let (e, g) = (&r.event, &r.grid);
        wtr.write_record(&[
            e.spec.date.to_string(),
            e.spec.rank.to_string(),
            e.spec.reference_peak.format(TS_FORMAT).to_string(),
            e.event_start.format(TS_FORMAT).to_string(),
            format!("{:.2}", e.spec.pre_peak_offset_hours),
            format!("{:.2}", e.spec.duration_hours),
            e.slots.to_string(),
            format!("{:.4}", e.window_energy_kwh),
            opt(e.avg_price_window),
            opt(e.avg_price_paid),
            format!("{:.2}", e.hours_paid_cap),
            format!("{:.4}", e.energy_cap_kwh),
            format!("{:.4}", e.monthly_energy_kwh),
            format!("{:.4}", e.monthly_cost),
            format!("{:.4}", e.event_max_compensation),
            format!("{:.4}", e.event_max_compensation_pct),
            format!("{:.4}", e.offer_pct),
            format!("{:.4}", e.raw_participation_rate),
            format!("{:.4}", e.capped_participation_rate),
            format!("{:.4}", e.shifted_energy_kwh),
            format!("{:.4}", e.market_value),
            format!("{:.4}", e.unit_payout_per_kwh),
            format!("{:.4}", e.compensation_per_household),
            g.households_in_scope.to_string(),
            format!("{:.4}", g.window_limit_kwh),
            format!("{:.4}", g.household_limit_kwh),
            format!("{:.4}", g.shiftable_energy_kwh),
            g.binding_constraint.to_string(),
            format!("{:.2}", g.total_compensation),
            e.iterations.to_string(),
            e.converged.to_string(),
            e.error_message.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports ranked days to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_ranking_csv(days: &[RankedDay], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_ranking_csv(days, io::BufWriter::new(file))
}

/// Writes ranked days as CSV to any writer, in rank order.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_ranking_csv(days: &[RankedDay], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(RANKING_HEADER.split(',').map(str::trim))?;

    for d in days {
        wtr.write_record(&[
            d.rank.to_string(),
            d.date.to_string(),
            format!("{:.4}", d.max_price_in_window),
            format!("{:.4}", d.avg_price_in_window),
            d.count_peaks_in_window.to_string(),
            format!("{:.4}", d.sum_prices_in_window),
            format!("{:.2}", d.window_duration_hours),
            format!("{:.4}", d.window_energy_sum),
            format!("{:.2}", d.window_energy_pct),
            d.window_start.format("%H:%M").to_string(),
            d.window_end.format("%H:%M").to_string(),
            d.reference_peak.format(TS_FORMAT).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::{EventSpec, SimulationEvent};
    use crate::sim::grid::aggregate;
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};

    fn make_record(i: i64) -> EventRecord {
        let spec = EventSpec {
            date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            rank: 1,
            reference_peak: Utc.with_ymd_and_hms(2024, 9, 2, 18, 0, 0).unwrap(),
            pre_peak_offset_hours: i as f64,
            duration_hours: 1.5,
        };
        let mut event = SimulationEvent::degenerate(spec, "");
        event.error_message = None;
        event.slots = 6;
        event.window_energy_kwh = 120.0;
        event.avg_price_window = Some(0.4);
        event.avg_price_paid = Some(0.45);
        event.capped_participation_rate = 0.3;
        event.energy_cap_kwh = 1.44;
        event.compensation_per_household = 0.2;
        event.converged = true;
        event.iterations = 9;
        let grid = aggregate(&event, 50);
        EventRecord { event, grid }
    }

    fn ranked(rank: usize) -> RankedDay {
        RankedDay {
            rank,
            date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap() + Duration::days(rank as i64),
            max_price_in_window: 0.9,
            avg_price_in_window: 0.7,
            count_peaks_in_window: 3,
            sum_prices_in_window: 2.1,
            window_duration_hours: 6.0,
            window_energy_sum: 4.2,
            window_energy_pct: 71.5,
            window_start: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            window_end: NaiveTime::MIN,
            reference_peak: Utc.with_ymd_and_hms(2024, 9, 2, 18, 0, 0).unwrap(),
        }
    }

    #[test]
    fn event_header_and_row_count() {
        let records: Vec<EventRecord> = (0..3).map(make_record).collect();
        let mut buf = Vec::new();
        write_events_csv(&records, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("event_date,rank,reference_peak_utc,event_start_utc,"));
        assert!(lines[0].ends_with("iterations,converged,error_message"));
    }

    #[test]
    fn event_rows_parse_back() {
        let records: Vec<EventRecord> = (0..2).map(make_record).collect();
        let mut buf = Vec::new();
        write_events_csv(&records, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(32));

        let rows: Vec<csv::StringRecord> = rdr.records().filter_map(Result::ok).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][3], "2024-09-02 17:00");
        assert_eq!(&rows[0][27], "per_household_cap");
        assert_eq!(&rows[0][30], "true");
        assert_eq!(&rows[0][31], "");
    }

    #[test]
    fn deterministic_output() {
        let records: Vec<EventRecord> = (0..3).map(make_record).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_events_csv(&records, &mut buf1).ok();
        write_events_csv(&records, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn ranking_rows_follow_rank_order() {
        let days = vec![ranked(1), ranked(2)];
        let mut buf = Vec::new();
        write_ranking_csv(&days, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,2024-09-03,0.9000,"));
        assert!(lines[2].contains(",16:00,00:00,"));
    }
}
