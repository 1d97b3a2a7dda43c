use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_WEATHER: &str = "Sunny";
pub const DEFAULT_STATUS: &str = "Regular Day";

// Raw form body: every field is optional text, validation happens later.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PredictionForm {
    pub month: String,
    pub day: String,
    pub year: String,
    pub time_of_day: String,
    pub temperature: String,
    pub weather: String,
    pub holiday: String,
    pub university_event: String,
}

/// A form that passed validation. Text fields are trimmed but otherwise verbatim;
/// defaults for blank weather/holiday/event are applied by the feature deriver.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub month: u32,
    pub day: u32,
    pub year: i32,
    pub time_of_day: String,
    pub temperature: f64,
    pub weather: String,
    pub holiday: String,
    pub university_event: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Case-insensitive token lookup; `None` for anything unrecognized.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Model-ready representation of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub month_name: &'static str,
    pub day: u32,
    pub day_of_week: &'static str,
    pub time_of_day: TimeOfDay,
    pub temperature: f64,
    pub weather: String,
    pub holiday: String,
    pub university_event: String,
}

/// One cell of the single-row model input.
#[derive(Debug, Clone, PartialEq)]
pub enum Column<'a> {
    Text(&'a str),
    Int(i64),
    Float(f64),
}

impl FeatureVector {
    /// Columns in the fixed order the model was trained on.
    pub fn columns(&self) -> [(&'static str, Column<'_>); 8] {
        [
            ("Month", Column::Text(self.month_name)),
            ("Day", Column::Int(i64::from(self.day))),
            ("Day_of_Week", Column::Text(self.day_of_week)),
            ("Time_of_Day", Column::Text(self.time_of_day.name())),
            ("Temperature", Column::Float(self.temperature)),
            ("Weather_Condition", Column::Text(&self.weather)),
            ("Holiday", Column::Text(&self.holiday)),
            ("University_Event", Column::Text(&self.university_event)),
        ]
    }
}

pub const LOG_HEADERS: [&str; 11] = [
    "Timestamp",
    "Month",
    "Day",
    "Year",
    "Day_of_Week",
    "Time_of_Day",
    "Temperature",
    "Weather_Condition",
    "Holiday",
    "University_Event",
    "Predicted_Cups_Sold",
];

/// A row of the prediction log. Field order matches `LOG_HEADERS`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Day_of_Week")]
    pub day_of_week: String,
    #[serde(rename = "Time_of_Day")]
    pub time_of_day: String,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Weather_Condition")]
    pub weather: String,
    #[serde(rename = "Holiday")]
    pub holiday: String,
    #[serde(rename = "University_Event")]
    pub university_event: String,
    #[serde(rename = "Predicted_Cups_Sold")]
    pub predicted_cups_sold: f64,
}

impl PredictionRecord {
    pub fn new(timestamp: String, year: i32, fv: &FeatureVector, prediction: f64) -> Self {
        Self {
            timestamp,
            month: fv.month_name.to_string(),
            day: fv.day,
            year,
            day_of_week: fv.day_of_week.to_string(),
            time_of_day: fv.time_of_day.name().to_string(),
            temperature: fv.temperature,
            weather: fv.weather.clone(),
            holiday: fv.holiday.clone(),
            university_event: fv.university_event.clone(),
            predicted_cups_sold: round2(prediction),
        }
    }
}

/// Two-decimal rounding with exact ties going to the even digit (1.125 -> 1.12).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_ties_to_even() {
        assert_eq!(round2(1.125), 1.12);
        assert_eq!(round2(2.625), 2.62);
        assert_eq!(round2(101.125), 101.12);
        assert_eq!(round2(1.375), 1.38);
        assert_eq!(round2(120.123), 120.12);
        assert_eq!(round2(-0.125), -0.12);
    }
}
