//! HTTP surface: the forecast endpoint plus health and
//! observability/administration projections of component state.

mod admin;
mod forecast;
mod health;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

/// Assemble every route on the gateway.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/models", get(admin::list_models))
        .route("/forecast", post(forecast::create_forecast))
        .route("/tiers", get(admin::list_tiers))
        .route("/usage", get(admin::recent_usage))
        .route("/runtime/status", get(admin::runtime_status))
        .route("/runtime/summary", get(admin::runtime_summary))
        .route("/runtime/clear", post(admin::runtime_clear))
}
