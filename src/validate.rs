use crate::error::RequestError;
use crate::types::{PredictionForm, PredictionRequest};
use std::num::IntErrorKind;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Check a raw form and turn it into a typed request.
///
/// Checks run in order and stop at the first failure: required fields present,
/// numeric fields parse, numeric fields within range. Day is not checked against
/// the month here; that happens when the calendar date is built.
pub fn validate(form: &PredictionForm) -> Result<PredictionRequest, RequestError> {
    let month = form.month.trim();
    let day = form.day.trim();
    let year = form.year.trim();
    let time_of_day = form.time_of_day.trim();
    let temperature = form.temperature.trim();

    if [month, day, year, temperature, time_of_day]
        .iter()
        .any(|s| s.is_empty())
    {
        return Err(RequestError::MissingField);
    }

    let month = parse_int("month", month)?;
    let day = parse_int("day", day)?;
    let year = parse_int("year", year)?;
    let temperature = parse_float("temperature", temperature)?;

    let month = in_range(month, 1..=12).ok_or(RequestError::MonthRange)?;
    let day = in_range(day, 1..=31).ok_or(RequestError::DayRange)?;
    let year = in_range(year, 2000..=2100).ok_or(RequestError::YearRange)?;
    if !(-50.0..=60.0).contains(&temperature) {
        return Err(RequestError::TemperatureRange);
    }

    Ok(PredictionRequest {
        month,
        day,
        year,
        time_of_day: time_of_day.to_string(),
        temperature,
        weather: form.weather.trim().to_string(),
        holiday: form.holiday.trim().to_string(),
        university_event: form.university_event.trim().to_string(),
    })
}

// Integers too wide for i64 saturate so they fail the range check, not the parse.
fn parse_int(field: &'static str, raw: &str) -> Result<i64, RequestError> {
    match i64::from_str(raw) {
        Ok(v) => Ok(v),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(RequestError::Parse {
                field,
                value: raw.to_string(),
            }),
        },
    }
}

fn in_range<T: TryFrom<i64>>(v: i64, bounds: RangeInclusive<i64>) -> Option<T> {
    if bounds.contains(&v) {
        T::try_from(v).ok()
    } else {
        None
    }
}

fn parse_float(field: &'static str, raw: &str) -> Result<f64, RequestError> {
    match f64::from_str(raw) {
        // infinities are numbers and fall through to the range check
        Ok(v) if !v.is_nan() => Ok(v),
        _ => Err(RequestError::Parse {
            field,
            value: raw.to_string(),
        }),
    }
}
