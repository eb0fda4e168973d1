//! Pipeline error taxonomy and HTTP mapping.
//!
//! Every pipeline-level failure is terminal for the request and carries a
//! machine-readable code plus a human-readable message. None of these errors
//! corrupt shared state: a failed quota check does not increment usage, a
//! failed authorization check does not write to the cache.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal failures of the forecast request pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("y must contain at least one observation")]
    EmptySeries,

    #[error("unknown tier: {0}")]
    UnknownTier(String),

    #[error("horizon {horizon} exceeds tier '{tier}' limit of {max_horizon}")]
    TierHorizonExceeded {
        tier: String,
        horizon: u32,
        max_horizon: u32,
    },

    #[error("daily quota of {limit} exhausted for '{key}'")]
    QuotaExceeded { key: String, limit: u32 },

    #[error("model '{model}' is not allowed for tier '{tier}'")]
    ModelNotAllowedForTier { model: String, tier: String },

    #[error("model execution failed: {0}")]
    ModelExecution(String),

    #[error("telemetry store error: {0}")]
    Telemetry(#[from] crate::telemetry::StoreError),
}

impl PipelineError {
    /// Machine-readable error code carried in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::EmptySeries => "empty_series",
            PipelineError::UnknownTier(_) => "unknown_tier",
            PipelineError::TierHorizonExceeded { .. } => "tier_horizon_exceeded",
            PipelineError::QuotaExceeded { .. } => "quota_exceeded",
            PipelineError::ModelNotAllowedForTier { .. } => "model_not_allowed_for_tier",
            PipelineError::ModelExecution(_) => "model_execution_failed",
            PipelineError::Telemetry(_) => "telemetry_unavailable",
        }
    }

    /// Error type classification, following the gateway error-body convention.
    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::EmptySeries | PipelineError::UnknownTier(_) => "invalid_request_error",
            PipelineError::TierHorizonExceeded { .. }
            | PipelineError::ModelNotAllowedForTier { .. } => "permission_error",
            PipelineError::QuotaExceeded { .. } => "rate_limit_error",
            PipelineError::ModelExecution(_) | PipelineError::Telemetry(_) => "server_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::EmptySeries | PipelineError::UnknownTier(_) => StatusCode::BAD_REQUEST,
            PipelineError::TierHorizonExceeded { .. }
            | PipelineError::ModelNotAllowedForTier { .. } => StatusCode::FORBIDDEN,
            PipelineError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            PipelineError::ModelExecution(_) | PipelineError::Telemetry(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse::with_type(self.error_type(), self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Standard error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorInfo,
}

/// Error information carried in every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error type classification (e.g. "invalid_request_error", "rate_limit_error").
    #[serde(rename = "type")]
    pub error_type: String,
    /// Machine-readable error code (e.g. "quota_exceeded").
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    pub fn with_type(
        error_type: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorInfo {
                error_type: error_type.into(),
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// Payload validation failure body, returned with 422.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_type("invalid_request_error", "validation_error", message)
    }
}
