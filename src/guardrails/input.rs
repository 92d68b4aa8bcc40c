//! Trip parameter checks, run before any agent is invoked.
//!
//! [`validate_input`] is pure and fail-fast: it stops at the first violated
//! constraint, always in the same order, and turns every parse problem into
//! a rejection.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::types::travel::{
    AccommodationTier, ActivityType, Interest, Season, TripFields, TripRequest,
};

pub const MIN_BUDGET: f64 = 50.0;
pub const MAX_BUDGET: f64 = 10_000.0;
pub const MIN_DURATION_DAYS: i64 = 1;
pub const MAX_DURATION_DAYS: i64 = 90;
pub const MAX_TRIP_SPAN_DAYS: i64 = 90;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Why trip input was refused. The display text is shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputRejection {
    #[error("Budget must be between $50 and $10,000")]
    Budget,
    #[error("Duration must be between 1 and 90 days")]
    Duration,
    #[error("Invalid preferences selected")]
    Preferences,
    #[error("Invalid date range")]
    DateRange,
    #[error("Invalid activities selected")]
    Activities,
    #[error("Invalid accommodation type")]
    Accommodation,
    #[error("Invalid season")]
    Season,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// The `(accepted, reason)` pair handed back to the form layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputVerdict {
    pub accepted: bool,
    pub reason: Option<String>,
}

impl From<Result<(), InputRejection>> for InputVerdict {
    fn from(result: Result<(), InputRejection>) -> Self {
        match result {
            Ok(()) => Self {
                accepted: true,
                reason: None,
            },
            Err(rejection) => Self {
                accepted: false,
                reason: Some(rejection.to_string()),
            },
        }
    }
}

pub fn validate_budget(budget: f64) -> bool {
    (MIN_BUDGET..=MAX_BUDGET).contains(&budget)
}

pub fn validate_duration(days: i64) -> bool {
    (MIN_DURATION_DAYS..=MAX_DURATION_DAYS).contains(&days)
}

pub fn validate_preferences<S: AsRef<str>>(preferences: &[S]) -> bool {
    preferences
        .iter()
        .all(|pref| Interest::from_label(pref.as_ref()).is_some())
}

pub fn validate_activities<S: AsRef<str>>(activities: &[S]) -> bool {
    activities
        .iter()
        .all(|activity| ActivityType::from_label(activity.as_ref()).is_some())
}

/// Both dates parse as `YYYY-MM-DD`, start is not before `today`, end is not
/// before start, and the span is at most 90 days.
pub fn validate_dates(start_date: &str, end_date: &str, today: NaiveDate) -> bool {
    let (Some(start), Some(end)) = (parse_date(start_date), parse_date(end_date)) else {
        return false;
    };

    start >= today && end >= start && (end - start).num_days() <= MAX_TRIP_SPAN_DAYS
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Validate trip fields against the current local date.
pub fn validate_input(fields: &TripFields) -> Result<(), InputRejection> {
    validate_input_on(fields, Local::now().date_naive())
}

/// Validate trip fields as of `today`. Only present fields are checked.
pub fn validate_input_on(fields: &TripFields, today: NaiveDate) -> Result<(), InputRejection> {
    let outcome = check_fields(fields, today);
    if let Err(rejection) = &outcome {
        debug!(target: "trip_planner::guardrails", %rejection, "input rejected");
    }
    outcome
}

fn check_fields(fields: &TripFields, today: NaiveDate) -> Result<(), InputRejection> {
    if let Some(budget) = fields.budget {
        if !validate_budget(budget) {
            return Err(InputRejection::Budget);
        }
    }

    if let Some(duration) = fields.duration {
        if !validate_duration(duration) {
            return Err(InputRejection::Duration);
        }
    }

    if let Some(preferences) = &fields.preferences {
        if !validate_preferences(preferences) {
            return Err(InputRejection::Preferences);
        }
    }

    if let (Some(start), Some(end)) = (&fields.start_date, &fields.end_date) {
        if !validate_dates(start, end, today) {
            return Err(InputRejection::DateRange);
        }
    }

    if let Some(activities) = &fields.activities {
        if !validate_activities(activities) {
            return Err(InputRejection::Activities);
        }
    }

    if let Some(accommodation) = &fields.accommodation {
        if AccommodationTier::from_label(accommodation).is_none() {
            return Err(InputRejection::Accommodation);
        }
    }

    if let Some(season) = &fields.season {
        if Season::from_label(season).is_none() {
            return Err(InputRejection::Season);
        }
    }

    Ok(())
}

impl TripRequest {
    /// Request for the city selection step: preferences, budget and duration
    /// are required.
    pub fn for_city_selection(fields: &TripFields) -> Result<Self, InputRejection> {
        Self::for_city_selection_on(fields, Local::now().date_naive())
    }

    pub fn for_city_selection_on(
        fields: &TripFields,
        today: NaiveDate,
    ) -> Result<Self, InputRejection> {
        validate_input_on(fields, today)?;
        match &fields.preferences {
            Some(preferences) if !preferences.is_empty() => {}
            _ => return Err(InputRejection::MissingField("preferences")),
        }
        require(&fields.budget, "budget")?;
        require(&fields.duration, "duration")?;
        Self::from_checked(fields)
    }

    /// Request for the travel planning step: destination, both dates, at
    /// least one activity and an accommodation tier are required.
    pub fn for_travel_planning(fields: &TripFields) -> Result<Self, InputRejection> {
        Self::for_travel_planning_on(fields, Local::now().date_naive())
    }

    pub fn for_travel_planning_on(
        fields: &TripFields,
        today: NaiveDate,
    ) -> Result<Self, InputRejection> {
        validate_input_on(fields, today)?;
        match fields.destination.as_deref().map(str::trim) {
            Some(destination) if !destination.is_empty() => {}
            _ => return Err(InputRejection::MissingField("destination")),
        }
        require(&fields.start_date, "start_date")?;
        require(&fields.end_date, "end_date")?;
        match &fields.activities {
            Some(activities) if !activities.is_empty() => {}
            _ => return Err(InputRejection::MissingField("activities")),
        }
        require(&fields.accommodation, "accommodation")?;
        Self::from_checked(fields)
    }

    /// Convert fields that already passed `validate_input`.
    fn from_checked(fields: &TripFields) -> Result<Self, InputRejection> {
        let interests = labels(fields.preferences.as_deref(), Interest::from_label)
            .ok_or(InputRejection::Preferences)?;
        let activities = labels(fields.activities.as_deref(), ActivityType::from_label)
            .ok_or(InputRejection::Activities)?;
        let accommodation = fields
            .accommodation
            .as_deref()
            .map(|label| AccommodationTier::from_label(label).ok_or(InputRejection::Accommodation))
            .transpose()?;
        let season = fields
            .season
            .as_deref()
            .map(|label| Season::from_label(label).ok_or(InputRejection::Season))
            .transpose()?;
        let start_date = fields
            .start_date
            .as_deref()
            .map(|text| parse_date(text).ok_or(InputRejection::DateRange))
            .transpose()?;
        let end_date = fields
            .end_date
            .as_deref()
            .map(|text| parse_date(text).ok_or(InputRejection::DateRange))
            .transpose()?;
        let duration = fields
            .duration
            .map(|days| u32::try_from(days).map_err(|_| InputRejection::Duration))
            .transpose()?;

        Ok(TripRequest {
            origin: fields.origin.clone(),
            destination: fields.destination.as_ref().map(|d| d.trim().to_string()),
            start_date,
            end_date,
            interests,
            activities,
            accommodation,
            season,
            budget: fields.budget,
            duration,
        })
    }
}

fn require<T>(value: &Option<T>, name: &'static str) -> Result<(), InputRejection> {
    match value {
        Some(_) => Ok(()),
        None => Err(InputRejection::MissingField(name)),
    }
}

fn labels<T>(values: Option<&[String]>, lookup: fn(&str) -> Option<T>) -> Option<Vec<T>> {
    values
        .unwrap_or_default()
        .iter()
        .map(|label| lookup(label))
        .collect()
}
