use std::sync::Arc;

use crate::{
    error::RequestError,
    features,
    model::Predictor,
    prediction_log::PredictionLog,
    types::{PredictionForm, PredictionRecord},
    validate::validate,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A successful inference.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Raw model output; the message and the log row carry the rounded form.
    pub value: f64,
    pub record: PredictionRecord,
    /// False when the log append failed; the prediction is still returned.
    pub logged: bool,
}

impl Prediction {
    pub fn message(&self) -> String {
        format!("Predicted iced coffee demand: {:.2} cups", self.value)
    }
}

/// validation -> features -> inference -> persistence
pub struct PredictionService {
    predictor: Option<Arc<dyn Predictor>>,
    log: PredictionLog,
    artifact: String,
}

impl PredictionService {
    /// `artifact` is the name shown to users when no predictor could be loaded.
    pub fn new(
        predictor: Option<Arc<dyn Predictor>>,
        log: PredictionLog,
        artifact: impl Into<String>,
    ) -> Self {
        Self {
            predictor,
            log,
            artifact: artifact.into(),
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.predictor.is_some()
    }

    pub fn log(&self) -> &PredictionLog {
        &self.log
    }

    pub fn predict(&self, form: &PredictionForm) -> Result<Prediction, RequestError> {
        let Some(predictor) = self.predictor.as_deref() else {
            return Err(RequestError::ModelUnavailable {
                artifact: self.artifact.clone(),
            });
        };

        tracing::debug!(
            "POST received: month={:?}, day={:?}, year={:?}, temp={:?}",
            form.month,
            form.day,
            form.year,
            form.temperature
        );

        let req = validate(form)?;
        let fv = features::derive(&req)?;
        tracing::debug!(?fv, "making prediction");

        let value = predictor.predict(&fv)?;
        tracing::info!("prediction result: {:.2}", value);

        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let record = PredictionRecord::new(timestamp, req.year, &fv, value);
        let logged = match self.log.append(&record) {
            Ok(()) => {
                tracing::debug!("prediction saved to {}", self.log.path().display());
                true
            }
            Err(e) => {
                tracing::warn!("prediction not recorded: {:#}", e);
                false
            }
        };

        Ok(Prediction {
            value,
            record,
            logged,
        })
    }
}
