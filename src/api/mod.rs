use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::engine::{PredictionEngine, PredictionError};
use crate::model::{
    Comparison, MatchupInput, PredictionResult, SimulationConfig, SimulationOverrides,
};

#[derive(Clone)]
pub struct AppState {
    pub engine: PredictionEngine,
}

/// Body of `POST /api/predict` and `POST /api/compare`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub matchup: MatchupInput,
    /// Per-request overrides; missing fields keep the server defaults
    #[serde(default)]
    pub config: Option<SimulationOverrides>,
}

/// Build the Axum router for the prediction service.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/config", get(config_handler))
        .route("/api/predict", post(predict_handler))
        .route("/api/compare", post(compare_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[derive(Debug)]
pub enum ApiError {
    Prediction(PredictionError),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Prediction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        ApiError::Prediction(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Prediction(e) => json!({ "error": e.kind(), "message": e.to_string() }),
            ApiError::Internal(msg) => json!({ "error": "internal", "message": msg }),
        };
        (status, Json(body)).into_response()
    }
}

/// GET /api/health
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /api/config
async fn config_handler(State(state): State<Arc<AppState>>) -> Json<SimulationConfig> {
    Json(state.engine.defaults().clone())
}

/// POST /api/predict
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictionResult>, ApiError> {
    let config = effective_config(&state.engine, req.config);
    let engine = state.engine.clone();
    run_blocking(move || engine.predict(&req.matchup, &config))
        .await
        .map(Json)
}

/// POST /api/compare
async fn compare_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<Comparison>, ApiError> {
    let config = effective_config(&state.engine, req.config);
    let engine = state.engine.clone();
    run_blocking(move || engine.compare(&req.matchup, &config))
        .await
        .map(Json)
}

/// Request overrides on top of the server defaults. The server's draw cap
/// always wins so a request cannot lift it.
fn effective_config(
    engine: &PredictionEngine,
    overrides: Option<SimulationOverrides>,
) -> SimulationConfig {
    overrides
        .unwrap_or_default()
        .apply_to(engine.defaults())
}

/// Simulations are CPU-bound; keep them off the async worker threads.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, PredictionError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(res) => res.map_err(ApiError::from),
        Err(e) => {
            error!("Prediction task failed: {}", e);
            Err(ApiError::Internal(e.to_string()))
        }
    }
}
