//! Survey-based participation model.

use std::collections::BTreeSet;

use crate::survey::{IncentiveChoice, SurveyRecord};

/// Source of participation rates for the equilibrium solver.
pub trait ParticipationSource {
    /// Raw participation rate (0..=1) for an event of `event_duration_hours`
    /// at `offered_incentive_pct`.
    fn participation_rate(&self, event_duration_hours: f64, offered_incentive_pct: f64) -> f64;
}

/// Participation result for one duration and incentive level.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipationMetrics {
    pub appliance: String,
    pub event_duration_hours: f64,
    pub offered_incentive_pct: f64,
    /// Distinct respondents answering for the appliance.
    pub base_population: usize,
    pub num_participants: usize,
    pub raw_participation_rate: f64,
}

/// Survey answers for one appliance.
#[derive(Debug, Clone)]
pub struct ParticipationModel {
    appliance: String,
    records: Vec<SurveyRecord>,
    base_population: usize,
}

impl ParticipationModel {
    /// Keeps the records answered for `appliance`.
    pub fn new(survey: &[SurveyRecord], appliance: &str) -> Self {
        let records: Vec<SurveyRecord> = survey
            .iter()
            .filter(|r| r.device == appliance)
            .cloned()
            .collect();
        let base_population = records
            .iter()
            .map(|r| r.respondent_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        Self {
            appliance: appliance.to_string(),
            records,
            base_population,
        }
    }

    pub fn appliance(&self) -> &str {
        &self.appliance
    }

    pub fn base_population(&self) -> usize {
        self.base_population
    }

    /// Counts respondents meeting both the duration and the incentive
    /// condition.
    pub fn metrics(&self, event_duration_hours: f64, offered_incentive_pct: f64) -> ParticipationMetrics {
        let participants: BTreeSet<&str> = self
            .records
            .iter()
            .filter(|r| !r.respondent_id.is_empty())
            .filter(|r| duration_met(r, event_duration_hours))
            .filter(|r| incentive_met(r, offered_incentive_pct))
            .map(|r| r.respondent_id.as_str())
            .collect();

        let num_participants = participants.len();
        let raw_participation_rate = if self.base_population > 0 {
            num_participants as f64 / self.base_population as f64
        } else {
            0.0
        };

        ParticipationMetrics {
            appliance: self.appliance.clone(),
            event_duration_hours,
            offered_incentive_pct,
            base_population: self.base_population,
            num_participants,
            raw_participation_rate,
        }
    }
}

impl ParticipationSource for ParticipationModel {
    fn participation_rate(&self, event_duration_hours: f64, offered_incentive_pct: f64) -> f64 {
        self.metrics(event_duration_hours, offered_incentive_pct)
            .raw_participation_rate
    }
}

fn duration_met(record: &SurveyRecord, event_duration_hours: f64) -> bool {
    match record.max_tolerable_duration_hours {
        None => false,
        // Zero means "not at all", not "for zero hours".
        Some(max) if max == 0.0 && event_duration_hours > 0.0 => false,
        Some(max) => max >= event_duration_hours,
    }
}

fn incentive_met(record: &SurveyRecord, offered_incentive_pct: f64) -> bool {
    match record.incentive_choice {
        IncentiveChoice::UnconditionalYes => true,
        IncentiveChoice::ConditionalYes => record
            .required_incentive_pct
            .is_some_and(|required| required <= offered_incentive_pct),
        IncentiveChoice::No | IncentiveChoice::Unknown => false,
    }
}

/// Evaluates the model over every duration × incentive pair, durations
/// outermost.
pub fn participation_grid(
    model: &ParticipationModel,
    durations_hours: &[f64],
    incentives_pct: &[f64],
) -> Vec<ParticipationMetrics> {
    durations_hours
        .iter()
        .flat_map(|&d| incentives_pct.iter().map(move |&p| model.metrics(d, p)))
        .collect()
}
