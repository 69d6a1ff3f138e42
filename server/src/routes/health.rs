use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime: u64,
    timestamp: String,
}

#[derive(Serialize)]
struct StatusResponse {
    message: &'static str,
    status: &'static str,
    environment: String,
    timestamp: String,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "FLWINS portal server is running",
        status: "ok",
        environment: state.config.environment.clone(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .with_state(state)
}
