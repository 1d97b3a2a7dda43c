use chrono::{Datelike, NaiveDate};

use crate::error::RequestError;
use crate::types::{FeatureVector, PredictionRequest, TimeOfDay, DEFAULT_STATUS, DEFAULT_WEATHER};

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const DAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Weekday name of a proleptic Gregorian date, `None` if the date does not exist.
pub fn day_of_week(year: i32, month: u32, day: u32) -> Option<&'static str> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(DAY_NAMES[date.weekday().num_days_from_monday() as usize])
}

/// Unrecognized tokens fall back to Morning. The fallback is logged so it can be
/// told apart from a real "morning" submission.
pub fn time_of_day(token: &str) -> TimeOfDay {
    TimeOfDay::from_token(token).unwrap_or_else(|| {
        tracing::warn!(token, "unrecognized time_of_day, defaulting to Morning");
        TimeOfDay::Morning
    })
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

pub fn derive(req: &PredictionRequest) -> Result<FeatureVector, RequestError> {
    let invalid_date = || RequestError::InvalidDate {
        year: req.year,
        month: req.month,
        day: req.day,
    };
    let month_name = month_name(req.month).ok_or_else(invalid_date)?;
    let day_of_week = day_of_week(req.year, req.month, req.day).ok_or_else(invalid_date)?;

    Ok(FeatureVector {
        month_name,
        day: req.day,
        day_of_week,
        time_of_day: time_of_day(&req.time_of_day),
        temperature: req.temperature,
        weather: or_default(&req.weather, DEFAULT_WEATHER),
        holiday: or_default(&req.holiday, DEFAULT_STATUS),
        university_event: or_default(&req.university_event, DEFAULT_STATUS),
    })
}
