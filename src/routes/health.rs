//! Liveness and readiness probes.

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Liveness probe. Succeeds whenever the process is running.
#[tracing::instrument(name = "health.check")]
pub async fn health() -> impl IntoResponse {
    Json(HealthStatus {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness probe. Checks that the telemetry store answers queries.
#[tracing::instrument(name = "health.readiness", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.telemetry.count().await {
        Ok(_) => StatusCode::OK,
        Err(error) => {
            tracing::warn!(%error, "telemetry store not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
