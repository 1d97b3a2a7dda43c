use std::sync::Arc;

use demand_predictor::{
    config::ServiceConfig,
    model,
    prediction_log::PredictionLog,
    service::PredictionService,
    web::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = ServiceConfig::from_env()?;
    tracing::info!("config: {:?}", cfg);

    // A missing or broken model is not fatal: the form reports it on every POST.
    let predictor = model::load_predictor(&cfg.model_path, &cfg.meta_path);

    let log = PredictionLog::new(&cfg.predictions_path);
    match log.ensure_header() {
        Ok(true) => tracing::info!("created {}", cfg.predictions_path.display()),
        Ok(false) => {}
        Err(e) => tracing::warn!("predictions will not be recorded: {:#}", e),
    }

    let artifact = cfg
        .model_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cfg.model_path.display().to_string());

    let state = AppState {
        service: Arc::new(PredictionService::new(predictor, log, artifact)),
    };
    let app = web::router(state);

    tracing::info!("listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
