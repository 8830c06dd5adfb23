//! TOML-based study configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

/// Top-level study configuration parsed from TOML.
///
/// All fields have defaults matching the dishwasher study. Load from
/// TOML with [`StudyConfig::from_toml_file`] or use
/// [`StudyConfig::dishwasher`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    /// Peak selection and window threshold.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Event grid: which days, offsets and durations to simulate.
    #[serde(default)]
    pub events: EventGridConfig,
    /// Appliance cycle properties and monthly energy basis.
    #[serde(default)]
    pub appliance: ApplianceConfig,
    /// Compensation benchmark and caps.
    #[serde(default)]
    pub compensation: CompensationConfig,
    /// Population scaling.
    #[serde(default)]
    pub grid: GridConfig,
    /// Fixed-point iteration settings.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Input data conventions.
    #[serde(default)]
    pub data: DataConfig,
}

/// Peak selection and window threshold.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Market year to analyse.
    pub year: i32,
    /// Appliance category (load column / survey device name).
    pub appliance: String,
    /// Number of highest-price intervals to keep.
    pub top_n: usize,
    /// Share of daily appliance energy the window must cover (0, 100].
    pub threshold_pct: f64,
    /// Multiplier applied to all prices before ranking (e.g. EUR to CHF).
    pub currency_multiplier: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            year: 2024,
            appliance: "dishwasher".to_string(),
            top_n: 150,
            threshold_pct: 70.0,
            currency_multiplier: 1.0,
        }
    }
}

/// Event grid: which days, offsets and durations to simulate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventGridConfig {
    /// Number of top-ranked days to simulate.
    pub simulate_days: usize,
    /// Hours the event starts before the reference peak.
    pub pre_peak_offsets_hours: Vec<f64>,
    /// Event durations in hours.
    pub durations_hours: Vec<f64>,
}

impl Default for EventGridConfig {
    fn default() -> Self {
        Self {
            simulate_days: 3,
            pre_peak_offsets_hours: vec![2.0, 1.0, 0.0],
            durations_hours: vec![1.5, 3.0, 4.5],
        }
    }
}

/// Monthly energy basis of the appliance, either fixed or derived per event month.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyEnergy {
    /// Same monthly energy (kWh) for every event.
    FixedMonthlyKwh(f64),
    /// Daily energy (kWh) multiplied by the days of the event's month.
    DailyKwh(f64),
}

/// Appliance cycle properties and monthly energy basis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplianceConfig {
    /// Energy of one full cycle (kWh).
    pub cycle_energy_kwh: f64,
    /// Duration of one full cycle (h).
    pub cycle_hours: f64,
    /// Longest event duration that is ever compensated (h).
    pub max_event_hours_paid: f64,
    /// Monthly energy basis for the compensation percentage.
    pub monthly_energy: MonthlyEnergy,
}

impl Default for ApplianceConfig {
    fn default() -> Self {
        Self {
            cycle_energy_kwh: 1.44,
            cycle_hours: 1.5,
            max_event_hours_paid: 3.0,
            monthly_energy: MonthlyEnergy::FixedMonthlyKwh(43.2),
        }
    }
}

/// Compensation benchmark and caps.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompensationConfig {
    /// Retail benchmark price used to express compensation as % of monthly cost.
    pub benchmark_price_per_kwh: f64,
    /// Highest participation rate ever assumed (0.0–1.0).
    pub population_participation_cap: f64,
    /// Highest offer as % of monthly appliance cost.
    pub global_max_compensation_pct: f64,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            benchmark_price_per_kwh: 0.29,
            population_participation_cap: 0.629,
            global_max_compensation_pct: 62.9,
        }
    }
}

/// Population scaling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Households with the appliance that the programme can reach.
    pub households_in_scope: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            households_in_scope: 100_000,
        }
    }
}

/// Fixed-point iteration settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Weight of the previous offer in the damped update, in [0, 1).
    pub damping: f64,
    /// Convergence tolerance in percentage points.
    pub tolerance_pct: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            damping: 0.5,
            tolerance_pct: 0.01,
        }
    }
}

/// Unit of the price column delivered by the market data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    PerKwh,
    PerMwh,
}

impl PriceUnit {
    /// Factor converting a raw value into currency per kWh.
    pub fn to_per_kwh(self) -> f64 {
        match self {
            Self::PerKwh => 1.0,
            Self::PerMwh => 1.0 / 1000.0,
        }
    }
}

/// Unit of the power columns delivered by the load data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadUnit {
    Kw,
    Mw,
}

impl LoadUnit {
    /// Factor converting a raw value into kW.
    pub fn to_kw(self) -> f64 {
        match self {
            Self::Kw => 1.0,
            Self::Mw => 1000.0,
        }
    }
}

/// Input data conventions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// IANA zone used to localize naive timestamps.
    pub timezone: String,
    /// Market clearing interval in minutes.
    pub interval_minutes: u32,
    pub price_unit: PriceUnit,
    pub load_unit: LoadUnit,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Zurich".to_string(),
            interval_minutes: 15,
            price_unit: PriceUnit::PerMwh,
            load_unit: LoadUnit::Mw,
        }
    }
}

impl DataConfig {
    /// Parses the configured time zone.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the name is not a known IANA zone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| ConfigError {
            field: "data.timezone".to_string(),
            message: format!("unknown time zone \"{}\"", self.timezone),
        })
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"selection.threshold_pct"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl StudyConfig {
    /// Returns the dishwasher study (fixed monthly basis of 30 cycles).
    pub fn dishwasher() -> Self {
        Self::default()
    }

    /// Returns the dishwasher study with a monthly basis derived from daily energy.
    pub fn dishwasher_daily_basis() -> Self {
        Self {
            appliance: ApplianceConfig {
                monthly_energy: MonthlyEnergy::DailyKwh(1.44),
                ..ApplianceConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the washing-machine study: longer cycles, fewer runs per month.
    pub fn washing_machine() -> Self {
        Self {
            selection: SelectionConfig {
                appliance: "washing_machine".to_string(),
                ..SelectionConfig::default()
            },
            events: EventGridConfig {
                durations_hours: vec![2.0, 4.5, 9.0],
                ..EventGridConfig::default()
            },
            appliance: ApplianceConfig {
                cycle_energy_kwh: 0.9,
                cycle_hours: 2.0,
                max_event_hours_paid: 3.0,
                monthly_energy: MonthlyEnergy::FixedMonthlyKwh(18.0),
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["dishwasher", "dishwasher_daily_basis", "washing_machine"];

    /// Loads a study from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "dishwasher" => Ok(Self::dishwasher()),
            "dishwasher_daily_basis" => Ok(Self::dishwasher_daily_basis()),
            "washing_machine" => Ok(Self::washing_machine()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a study from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a study from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Interval length in hours.
    pub fn interval_hours(&self) -> f64 {
        f64::from(self.data.interval_minutes) / 60.0
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let sel = &self.selection;
        if sel.top_n == 0 {
            errors.push(ConfigError::new("selection.top_n", "must be > 0"));
        }
        if !(sel.threshold_pct > 0.0 && sel.threshold_pct <= 100.0) {
            errors.push(ConfigError::new(
                "selection.threshold_pct",
                "must be in (0, 100]",
            ));
        }
        if !(sel.currency_multiplier.is_finite() && sel.currency_multiplier > 0.0) {
            errors.push(ConfigError::new(
                "selection.currency_multiplier",
                "must be a finite number > 0",
            ));
        }
        if sel.appliance.trim().is_empty() {
            errors.push(ConfigError::new("selection.appliance", "must not be empty"));
        }

        let ev = &self.events;
        if ev.pre_peak_offsets_hours.is_empty() {
            errors.push(ConfigError::new(
                "events.pre_peak_offsets_hours",
                "must list at least one offset",
            ));
        }
        if ev
            .pre_peak_offsets_hours
            .iter()
            .any(|h| !h.is_finite() || *h < 0.0)
        {
            errors.push(ConfigError::new(
                "events.pre_peak_offsets_hours",
                "offsets must be finite and >= 0",
            ));
        }
        if ev.durations_hours.is_empty() {
            errors.push(ConfigError::new(
                "events.durations_hours",
                "must list at least one duration",
            ));
        }
        if ev.durations_hours.iter().any(|h| !h.is_finite() || *h <= 0.0) {
            errors.push(ConfigError::new(
                "events.durations_hours",
                "durations must be finite and > 0",
            ));
        }

        let app = &self.appliance;
        if app.cycle_energy_kwh <= 0.0 {
            errors.push(ConfigError::new("appliance.cycle_energy_kwh", "must be > 0"));
        }
        if app.cycle_hours <= 0.0 {
            errors.push(ConfigError::new("appliance.cycle_hours", "must be > 0"));
        }
        if app.max_event_hours_paid <= 0.0 {
            errors.push(ConfigError::new(
                "appliance.max_event_hours_paid",
                "must be > 0",
            ));
        }
        let basis = match app.monthly_energy {
            MonthlyEnergy::FixedMonthlyKwh(kwh) | MonthlyEnergy::DailyKwh(kwh) => kwh,
        };
        if basis <= 0.0 {
            errors.push(ConfigError::new("appliance.monthly_energy", "must be > 0"));
        }

        let comp = &self.compensation;
        if comp.benchmark_price_per_kwh <= 0.0 {
            errors.push(ConfigError::new(
                "compensation.benchmark_price_per_kwh",
                "must be > 0",
            ));
        }
        if !(0.0..=1.0).contains(&comp.population_participation_cap) {
            errors.push(ConfigError::new(
                "compensation.population_participation_cap",
                "must be in [0.0, 1.0]",
            ));
        }
        if comp.global_max_compensation_pct < 0.0 {
            errors.push(ConfigError::new(
                "compensation.global_max_compensation_pct",
                "must be >= 0",
            ));
        }

        let sol = &self.solver;
        if sol.max_iterations == 0 {
            errors.push(ConfigError::new("solver.max_iterations", "must be > 0"));
        }
        if !(0.0..1.0).contains(&sol.damping) {
            errors.push(ConfigError::new("solver.damping", "must be in [0.0, 1.0)"));
        }
        if sol.tolerance_pct <= 0.0 {
            errors.push(ConfigError::new("solver.tolerance_pct", "must be > 0"));
        }

        let data = &self.data;
        if data.interval_minutes == 0 || 60 % data.interval_minutes != 0 {
            errors.push(ConfigError::new(
                "data.interval_minutes",
                "must be > 0 and divide 60",
            ));
        }
        if let Err(e) = data.tz() {
            errors.push(e);
        }

        errors
    }
}
