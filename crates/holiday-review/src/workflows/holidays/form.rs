use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{format_calendar_date, DATE_FORMAT};
use super::solver::{ComputeRequest, SolveMode};
use crate::config::ReviewDefaults;

/// Raw compute form values, exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeForm {
    pub start_date: String,
    pub end_date: String,
    pub min_proximity_days: String,
}

impl ComputeForm {
    pub fn from_defaults(defaults: &ReviewDefaults) -> Self {
        Self {
            start_date: format_calendar_date(defaults.start_date),
            end_date: format_calendar_date(defaults.end_date),
            min_proximity_days: defaults.min_proximity_days.to_string(),
        }
    }

    pub fn validate(&self, mode: SolveMode) -> Result<ComputeRequest, ValidationError> {
        let start_date = parse_form_date("start date", &self.start_date)?;
        let end_date = parse_form_date("end date", &self.end_date)?;
        let min_proximity_days = self
            .min_proximity_days
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidMinProximity(self.min_proximity_days.clone()))?;

        Ok(ComputeRequest {
            mode,
            start_date,
            end_date,
            min_proximity_days,
        })
    }
}

fn parse_form_date(field: &'static str, raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    let invalid = || ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    };

    // chrono accepts unpadded fields; the form only takes YYYY-MM-DD.
    if trimmed.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| invalid())
}

/// Reasons a compute action is refused before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("select an .xlsx input file first")]
    MissingInput,
    #[error("only .xlsx files are accepted (got '{0}')")]
    UnsupportedInput(String),
    #[error("{field} must be a YYYY-MM-DD date (got '{value}')")]
    InvalidDate { field: &'static str, value: String },
    #[error("min proximity days must be an integer >= 0 (got '{0}')")]
    InvalidMinProximity(String),
    #[error("a computation is already in progress")]
    ComputationPending,
}
