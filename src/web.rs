use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use std::sync::Arc;

use crate::{error::RequestError, pages, service::PredictionService, types::PredictionForm};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/download_predictions", get(download_predictions))
        .route("/view_predictions", get(view_predictions))
        .with_state(state)
}

// ---------- Handlers ----------

pub async fn index() -> Html<String> {
    Html(pages::index(None, None))
}

/// Every outcome, failures included, is rendered on the form page.
pub async fn submit(
    State(state): State<AppState>,
    form: Result<Form<PredictionForm>, FormRejection>,
) -> Html<String> {
    let result = match form {
        Ok(Form(f)) => {
            // inference and the log append are blocking work
            let service = state.service.clone();
            tokio::task::spawn_blocking(move || service.predict(&f))
                .await
                .unwrap_or_else(|e| Err(RequestError::Unhandled(e.to_string())))
        }
        Err(e) => Err(RequestError::Unhandled(e.body_text())),
    };

    match result {
        Ok(p) => Html(pages::index(Some(&p.message()), None)),
        Err(e) => {
            tracing::info!("request rejected: {}", e);
            Html(pages::index(None, Some(&e.to_string())))
        }
    }
}

pub async fn download_predictions(State(state): State<AppState>) -> Response {
    match state.service.log().read_raw() {
        Ok(Some(bytes)) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"predictions.csv\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, pages::NO_PREDICTIONS).into_response(),
        Err(e) => {
            tracing::error!("cannot read predictions: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}

pub async fn view_predictions(State(state): State<AppState>) -> Response {
    match state.service.log().read_table() {
        Ok(table) => Html(pages::predictions(table.as_ref())).into_response(),
        Err(e) => {
            tracing::error!("cannot read predictions: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}
