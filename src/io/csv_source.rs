//! CSV-backed input providers.
//!
//! Prices: `timestamp,price`. Load: `timestamp` plus one column per
//! appliance. Survey: the flattened [`SurveyRecord`] table. Timestamps are
//! RFC 3339 or naive local time in the configured zone.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::config::{DataConfig, LoadUnit, PriceUnit};
use crate::error::FlexError;
use crate::series::localize::{TimestampCell, parse_timestamp, resolve_cells};
use crate::series::{LoadPoint, LoadSeries, PricePoint, PriceSeries};
use crate::survey::SurveyRecord;

use super::provider::{LoadProvider, PriceProvider, SurveyProvider, year_bounds};

const TIMESTAMP: &str = "timestamp";
const PRICE: &str = "price";

fn open(path: &Path) -> Result<BufReader<File>, FlexError> {
    Ok(BufReader::new(File::open(path)?))
}

fn source_name(path: &Path) -> String {
    path.display().to_string()
}

/// Reads `timestamp` and `value_column`, returning UTC timestamps with the
/// raw values. Empty value cells become `None`.
fn read_column<R: Read>(
    reader: R,
    value_column: &str,
    tz: Tz,
    source: &str,
) -> Result<Vec<(DateTime<Utc>, Option<f64>)>, FlexError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let ts_idx = headers
        .iter()
        .position(|h| h == TIMESTAMP)
        .ok_or_else(|| FlexError::missing_column(TIMESTAMP, source))?;
    let val_idx = headers
        .iter()
        .position(|h| h == value_column)
        .ok_or_else(|| FlexError::missing_column(value_column, source))?;

    let mut cells: Vec<TimestampCell> = Vec::new();
    let mut values: Vec<Option<f64>> = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is row 1.
        let row = i + 2;
        let raw_ts = record.get(ts_idx).unwrap_or("");
        let cell = parse_timestamp(raw_ts).ok_or_else(|| FlexError::InvalidValue {
            column: TIMESTAMP.to_string(),
            value: raw_ts.to_string(),
            row,
        })?;
        let raw_val = record.get(val_idx).unwrap_or("");
        let value = if raw_val.is_empty() {
            None
        } else {
            Some(raw_val.parse::<f64>().map_err(|_| FlexError::InvalidValue {
                column: value_column.to_string(),
                value: raw_val.to_string(),
                row,
            })?)
        };
        cells.push(cell);
        values.push(value);
    }

    Ok(resolve_cells(tz, &cells).into_iter().zip(values).collect())
}

/// Parses a price table. Missing prices are kept as NaN.
///
/// # Errors
///
/// [`FlexError::MissingColumn`] when `timestamp` or `price` is absent,
/// [`FlexError::InvalidValue`] for unparseable cells.
pub fn read_prices<R: Read>(
    reader: R,
    tz: Tz,
    unit: PriceUnit,
    source: &str,
) -> Result<PriceSeries, FlexError> {
    let factor = unit.to_per_kwh();
    let points = read_column(reader, PRICE, tz, source)?
        .into_iter()
        .map(|(timestamp, v)| PricePoint {
            timestamp,
            price_per_kwh: v.map_or(f64::NAN, |p| p * factor),
        })
        .collect();
    Ok(PriceSeries::new(points))
}

/// Parses one appliance column of a wide load table. Rows with an empty
/// cell are skipped.
///
/// # Errors
///
/// As [`read_prices`], with the appliance name as the value column.
pub fn read_load<R: Read>(
    reader: R,
    appliance: &str,
    tz: Tz,
    unit: LoadUnit,
    source: &str,
) -> Result<LoadSeries, FlexError> {
    let factor = unit.to_kw();
    let points = read_column(reader, appliance, tz, source)?
        .into_iter()
        .filter_map(|(timestamp, v)| {
            v.map(|power| LoadPoint {
                timestamp,
                power_kw: power * factor,
            })
        })
        .collect();
    Ok(LoadSeries::new(points))
}

/// Parses the flattened survey table.
///
/// # Errors
///
/// [`FlexError::Csv`] for rows that do not match the table layout.
pub fn read_survey<R: Read>(reader: R) -> Result<Vec<SurveyRecord>, FlexError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize::<SurveyRecord>() {
        let r = row?;
        records.push(SurveyRecord::new(
            r.respondent_id,
            r.device,
            r.max_tolerable_duration_hours,
            r.incentive_choice,
            r.required_incentive_pct,
        ));
    }
    Ok(records)
}

/// Price provider reading a `timestamp,price` CSV file.
#[derive(Debug, Clone)]
pub struct CsvPriceProvider {
    path: PathBuf,
    tz: Tz,
    unit: PriceUnit,
}

impl CsvPriceProvider {
    /// # Errors
    ///
    /// [`FlexError::Config`] if the configured time zone is unknown.
    pub fn new(path: impl Into<PathBuf>, data: &DataConfig) -> Result<Self, FlexError> {
        Ok(Self {
            path: path.into(),
            tz: data.tz()?,
            unit: data.price_unit,
        })
    }
}

impl PriceProvider for CsvPriceProvider {
    fn price_series(&self, year: i32) -> Result<PriceSeries, FlexError> {
        let name = source_name(&self.path);
        let all = read_prices(open(&self.path)?, self.tz, self.unit, &name)?;
        match year_bounds(year) {
            Some((start, end)) => Ok(PriceSeries::new(all.slice(start, end))),
            None => Ok(PriceSeries::default()),
        }
    }
}

/// Load provider reading a wide `timestamp,<appliance>...` CSV file.
#[derive(Debug, Clone)]
pub struct CsvLoadProvider {
    path: PathBuf,
    tz: Tz,
    unit: LoadUnit,
}

impl CsvLoadProvider {
    /// # Errors
    ///
    /// [`FlexError::Config`] if the configured time zone is unknown.
    pub fn new(path: impl Into<PathBuf>, data: &DataConfig) -> Result<Self, FlexError> {
        Ok(Self {
            path: path.into(),
            tz: data.tz()?,
            unit: data.load_unit,
        })
    }
}

impl LoadProvider for CsvLoadProvider {
    fn load_series(
        &self,
        appliance: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<LoadSeries, FlexError> {
        let name = source_name(&self.path);
        let all = read_load(open(&self.path)?, appliance, self.tz, self.unit, &name)?;
        Ok(LoadSeries::new(
            all.points()
                .iter()
                .filter(|p| p.timestamp >= start && p.timestamp < end)
                .copied()
                .collect(),
        ))
    }
}

/// Survey provider reading the flattened survey CSV file.
#[derive(Debug, Clone)]
pub struct CsvSurveyProvider {
    path: PathBuf,
}

impl CsvSurveyProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SurveyProvider for CsvSurveyProvider {
    fn survey_table(&self, appliance: &str) -> Result<Vec<SurveyRecord>, FlexError> {
        Ok(read_survey(open(&self.path)?)?
            .into_iter()
            .filter(|r| r.device == appliance)
            .collect())
    }
}
