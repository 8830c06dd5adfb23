//! Mapping of raw survey answer text to [`SurveyRecord`] fields.
//!
//! Every function here is pure. Text that matches no known pattern maps to
//! `None` or [`IncentiveChoice::Unknown`], never to a default answer.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{IncentiveChoice, SurveyRecord};

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("number pattern compiles"));

/// Fixed answer table for the tolerable-duration question.
pub const DURATION_ANSWERS: &[(&str, f64)] = &[
    ("Nein, auf keinen Fall", 0.0),
    ("Ja, aber maximal für 3 Stunden", 1.5),
    ("Ja, für 3 bis 6 Stunden", 4.5),
    ("Ja, für 6 bis 12 Stunden", 9.0),
    ("Ja, für maximal 24 Stunden", 24.0),
    ("Ja, für mehr als 24 Stunden", 30.0),
];

/// Representative hours for a duration answer, `None` if unmapped.
pub fn duration_hours_from_text(text: &str) -> Option<f64> {
    let text = text.trim();
    DURATION_ANSWERS
        .iter()
        .find(|(answer, _)| *answer == text)
        .map(|&(_, hours)| hours)
}

fn first_number(text: &str) -> Option<f64> {
    let m = NUMBER.captures(text)?.get(1)?;
    m.as_str().replace(',', ".").parse().ok()
}

fn is_bare_number(text: &str) -> bool {
    NUMBER
        .find(text)
        .is_some_and(|m| m.start() == 0 && m.end() == text.len())
}

/// Parses a free-text incentive answer.
///
/// * a bare number: conditional yes at that percentage
/// * contains "nein": no
/// * "ja" with a fixed/flat-rate marker: unconditional yes at 0%
/// * "ja", "+", "%", "prozent" or "pct": conditional yes when a number or
///   "+" is present, otherwise unconditional
/// * anything else: unknown
pub fn incentive_from_text(text: &str) -> (IncentiveChoice, Option<f64>) {
    let s = text.trim().to_lowercase();
    if s.is_empty() {
        return (IncentiveChoice::Unknown, None);
    }
    if is_bare_number(&s) {
        return (IncentiveChoice::ConditionalYes, first_number(&s));
    }
    if s.contains("nein") {
        return (IncentiveChoice::No, None);
    }
    let flat = s == "f" || s.contains("fix") || s.contains("pausch");
    if s.contains("ja") && flat {
        return (IncentiveChoice::UnconditionalYes, Some(0.0));
    }
    let markers = ["ja", "+", "%", "prozent", "pct"];
    if markers.iter().any(|m| s.contains(m)) {
        let pct = first_number(&s);
        if s.contains('+') || pct.is_some() {
            return (IncentiveChoice::ConditionalYes, pct);
        }
        return (IncentiveChoice::UnconditionalYes, Some(0.0));
    }
    (IncentiveChoice::Unknown, None)
}

/// Maps a choice label to its canonical value.
///
/// Accepts the canonical labels as well as the raw `Ja, f` / `Ja, +` /
/// `Nein` codes.
pub fn canonical_choice(label: &str) -> IncentiveChoice {
    let s = label.trim().to_lowercase();
    match s.as_str() {
        "yes_fixed" | "unconditional_yes" => return IncentiveChoice::UnconditionalYes,
        "yes_conditional" | "conditional_yes" => return IncentiveChoice::ConditionalYes,
        "no" => return IncentiveChoice::No,
        _ => {}
    }
    if s.starts_with("ja, f") || s.contains("fix") {
        IncentiveChoice::UnconditionalYes
    } else if s.starts_with("ja, +") || s.contains("zus") || s.contains("conditional") {
        IncentiveChoice::ConditionalYes
    } else if s.starts_with("nein") {
        IncentiveChoice::No
    } else {
        IncentiveChoice::Unknown
    }
}

/// Builds a record from one respondent's raw answers for one appliance.
pub fn record_from_answers(
    respondent_id: &str,
    device: &str,
    duration_text: Option<&str>,
    incentive_text: Option<&str>,
) -> SurveyRecord {
    let hours = duration_text.and_then(duration_hours_from_text);
    let (choice, pct) = incentive_text
        .map(incentive_from_text)
        .unwrap_or((IncentiveChoice::Unknown, None));
    SurveyRecord::new(respondent_id, device, hours, choice, pct)
}
