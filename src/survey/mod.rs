//! Normalized household survey data.

pub mod normalize;

use serde::{Deserialize, Serialize};

/// A respondent's answer to the incentive question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncentiveChoice {
    /// Willing to take part for a flat payment.
    #[serde(alias = "yes_fixed")]
    UnconditionalYes,
    /// Willing to take part above a required incentive percentage.
    #[serde(alias = "yes_conditional")]
    ConditionalYes,
    No,
    #[serde(other)]
    Unknown,
}

/// One respondent's willingness for one appliance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SurveyRecord {
    pub respondent_id: String,
    pub device: String,
    /// `None` when unanswered; `0` means not willing at all.
    pub max_tolerable_duration_hours: Option<f64>,
    pub incentive_choice: IncentiveChoice,
    /// Required share of the monthly appliance cost, in percent.
    pub required_incentive_pct: Option<f64>,
}

impl SurveyRecord {
    pub fn new(
        respondent_id: impl Into<String>,
        device: impl Into<String>,
        max_tolerable_duration_hours: Option<f64>,
        incentive_choice: IncentiveChoice,
        required_incentive_pct: Option<f64>,
    ) -> Self {
        let required_incentive_pct = match incentive_choice {
            IncentiveChoice::UnconditionalYes => Some(0.0),
            _ => required_incentive_pct,
        };
        Self {
            respondent_id: respondent_id.into(),
            device: device.into(),
            max_tolerable_duration_hours,
            incentive_choice,
            required_incentive_pct,
        }
    }
}
