//! Library error type.

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while building inputs or running the pipeline.
///
/// Per-event numerical problems are not errors: they are reported in-band
/// through `SimulationEvent::error_message`.
#[derive(Debug, Error)]
pub enum FlexError {
    /// An input series has no usable points.
    #[error("series `{0}` has no points")]
    EmptySeries(String),

    /// A required column or value set is absent from an input.
    #[error("missing column `{column}` in {source_name}")]
    MissingColumn {
        column: String,
        source_name: String,
    },

    /// The window search could not reach its own target.
    #[error("threshold {threshold_pct}% unreachable on {date}")]
    UnreachableThreshold { date: NaiveDate, threshold_pct: f64 },

    /// A CSV cell could not be interpreted.
    #[error("invalid value `{value}` for `{column}` at row {row}")]
    InvalidValue {
        column: String,
        value: String,
        row: usize,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl FlexError {
    pub(crate) fn missing_column(column: &str, source_name: &str) -> Self {
        Self::MissingColumn {
            column: column.to_string(),
            source_name: source_name.to_string(),
        }
    }
}
