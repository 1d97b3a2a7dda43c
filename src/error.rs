use thiserror::Error;

/// Everything that can go wrong between a form submission and a prediction.
/// `Display` is the message shown on the form page.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    #[error("Please fill all required fields")]
    MissingField,

    #[error("Input error: could not convert {field} value '{value}' to a number")]
    Parse { field: &'static str, value: String },

    #[error("Month must be between 1 and 12")]
    MonthRange,

    #[error("Day must be between 1 and 31")]
    DayRange,

    #[error("Year must be between 2000 and 2100")]
    YearRange,

    #[error("Temperature must be between -50 and 60°C")]
    TemperatureRange,

    #[error("Input error: day is out of range for month")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Model not loaded. Please ensure '{artifact}' exists.")]
    ModelUnavailable { artifact: String },

    #[error("Error: {0}")]
    Unhandled(String),
}

impl From<anyhow::Error> for RequestError {
    fn from(e: anyhow::Error) -> Self {
        Self::Unhandled(format!("{:#}", e))
    }
}
