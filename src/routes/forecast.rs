//! The forecast endpoint.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use validator::Validate;

use crate::{
    AppState,
    api_types::{ForecastRequest, ForecastResponse},
    error::ErrorResponse,
    pipeline::RequestContext,
};

/// Tier name header; absent means the default tier.
pub const TIER_HEADER: &str = "x-meridian-tier";
/// Client identifier header; absent means `anonymous`.
pub const CLIENT_HEADER: &str = "x-client-id";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Generate a forecast for the given time series.
#[tracing::instrument(name = "forecast.create", skip(state, headers, payload))]
pub async fn create_forecast(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ForecastRequest>,
) -> Result<Json<ForecastResponse>, Response> {
    if let Err(errors) = payload.validate() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::validation(errors.to_string())),
        )
            .into_response());
    }

    let ctx = RequestContext {
        tier: header_value(&headers, TIER_HEADER),
        client_id: header_value(&headers, CLIENT_HEADER),
    };

    state
        .pipeline
        .handle(payload, ctx)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}
