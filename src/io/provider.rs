//! Input provider contracts and study input assembly.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::info;

use crate::config::StudyConfig;
use crate::error::FlexError;
use crate::series::{EnergySeries, LoadSeries, PriceSeries};
use crate::survey::SurveyRecord;

/// Market prices in currency per kWh.
pub trait PriceProvider {
    /// Prices for the whole calendar `year` (UTC).
    fn price_series(&self, year: i32) -> Result<PriceSeries, FlexError>;
}

/// Appliance power in kW.
pub trait LoadProvider {
    /// Power for `appliance` with `start <= timestamp < end`.
    fn load_series(
        &self,
        appliance: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<LoadSeries, FlexError>;
}

/// Normalized survey answers.
pub trait SurveyProvider {
    /// Records answered for `appliance`.
    fn survey_table(&self, appliance: &str) -> Result<Vec<SurveyRecord>, FlexError>;
}

/// Inputs of one study run, loaded once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct StudyInputs {
    pub prices: PriceSeries,
    /// Appliance energy per interval.
    pub energy: EnergySeries,
    pub survey: Vec<SurveyRecord>,
}

/// UTC bounds of a calendar year, `[Jan 1, Jan 1 next year)`.
pub fn year_bounds(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single()?;
    Some((start, end))
}

/// Fetches prices, load and survey for the configured year and appliance.
///
/// Load is resampled to the configured interval by forward fill and turned
/// into energy per interval.
///
/// # Errors
///
/// * [`FlexError::EmptySeries`] if prices or load are empty
/// * any provider error
pub fn load_inputs(
    config: &StudyConfig,
    prices: &impl PriceProvider,
    load: &impl LoadProvider,
    survey: &impl SurveyProvider,
) -> Result<StudyInputs, FlexError> {
    let year = config.selection.year;
    let appliance = &config.selection.appliance;
    let (start, end) = year_bounds(year)
        .ok_or_else(|| FlexError::EmptySeries(format!("year {year}")))?;

    let price_series = prices.price_series(year)?;
    if price_series.is_empty() {
        return Err(FlexError::EmptySeries("prices".into()));
    }
    let load_series = load.load_series(appliance, start, end)?;
    if load_series.is_empty() {
        return Err(FlexError::EmptySeries(format!("load `{appliance}`")));
    }
    let records = survey.survey_table(appliance)?;

    let interval = Duration::minutes(i64::from(config.data.interval_minutes));
    let energy = load_series.resample_ffill(interval).to_energy(interval);
    info!(
        prices = price_series.len(),
        load = load_series.len(),
        energy = energy.len(),
        respondents = records.len(),
        "loaded study inputs"
    );

    Ok(StudyInputs {
        prices: price_series,
        energy,
        survey: records,
    })
}
