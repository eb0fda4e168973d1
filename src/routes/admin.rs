//! Introspection and administrative endpoints.
//!
//! Thin read-only projections of component state plus independently
//! toggleable clears. None of this is on the request pipeline's path.

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    api_types::ModelInfo,
    cache::CacheStats,
    error::PipelineError,
    quota::QuotaStats,
    telemetry::{UsageEvent, UsageSummary},
    tiers::TierPolicy,
};

/// List available forecast models and their routing eligibility.
#[tracing::instrument(name = "admin.models", skip(state))]
pub async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelInfo>> {
    Json(state.engines.catalog(&state.config.routing))
}

#[derive(Debug, Serialize)]
pub struct TierListing {
    pub default_tier: String,
    pub tiers: Vec<TierPolicy>,
}

/// Tier configuration, sorted by tier name.
#[tracing::instrument(name = "admin.tiers", skip(state))]
pub async fn list_tiers(State(state): State<AppState>) -> Json<TierListing> {
    Json(TierListing {
        default_tier: state.tiers.default_tier(),
        tiers: state.tiers.list_all(),
    })
}

#[derive(Debug, Deserialize)]
pub struct UsageParams {
    #[serde(default = "default_usage_limit")]
    pub limit: u32,
}

fn default_usage_limit() -> u32 {
    50
}

#[derive(Debug, Serialize)]
pub struct UsageListing {
    pub items: Vec<UsageEvent>,
}

/// Most recent usage events, oldest-to-newest.
#[tracing::instrument(name = "admin.usage", skip(state))]
pub async fn recent_usage(
    State(state): State<AppState>,
    Query(params): Query<UsageParams>,
) -> Result<Json<UsageListing>, PipelineError> {
    let items = state.telemetry.recent(params.limit).await?;
    Ok(Json(UsageListing { items }))
}

#[derive(Debug, Serialize)]
pub struct RuntimeStatus {
    pub cache: CacheStats,
    pub quota: QuotaStats,
    pub usage: UsageStatus,
}

#[derive(Debug, Serialize)]
pub struct UsageStatus {
    pub stored_events: u64,
}

/// Cache, quota, and telemetry statistics in one read.
#[tracing::instrument(name = "admin.runtime_status", skip(state))]
pub async fn runtime_status(
    State(state): State<AppState>,
) -> Result<Json<RuntimeStatus>, PipelineError> {
    let stored_events = state.telemetry.count().await?;
    Ok(Json(RuntimeStatus {
        cache: state.cache.stats(),
        quota: state
            .quota
            .stats(state.config.telemetry.quota_top_n, Utc::now().date_naive()),
        usage: UsageStatus { stored_events },
    }))
}

#[derive(Debug, Serialize)]
pub struct RuntimeSummary {
    pub usage: UsageSummary,
}

/// Aggregate usage statistics.
#[tracing::instrument(name = "admin.runtime_summary", skip(state))]
pub async fn runtime_summary(
    State(state): State<AppState>,
) -> Result<Json<RuntimeSummary>, PipelineError> {
    let usage = state.telemetry.summary().await?;
    Ok(Json(RuntimeSummary { usage }))
}

#[derive(Debug, Deserialize)]
pub struct ClearParams {
    #[serde(default = "default_true")]
    pub cache: bool,
    #[serde(default = "default_true")]
    pub quota: bool,
    #[serde(default = "default_true")]
    pub usage: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ClearedCounts {
    pub cache_entries: u64,
    pub quota_keys: u64,
    pub usage_events: u64,
}

#[derive(Debug, Serialize)]
pub struct ClearResult {
    pub cleared: ClearedCounts,
}

/// Administrative reset. Each store is independently toggleable via query
/// parameters; all default to true.
#[tracing::instrument(name = "admin.runtime_clear", skip(state))]
pub async fn runtime_clear(
    State(state): State<AppState>,
    Query(params): Query<ClearParams>,
) -> Result<impl IntoResponse, PipelineError> {
    let cache_entries = if params.cache {
        state.cache.clear() as u64
    } else {
        0
    };
    let quota_keys = if params.quota {
        state.quota.clear() as u64
    } else {
        0
    };
    let usage_events = if params.usage {
        state.telemetry.clear().await?
    } else {
        0
    };

    tracing::info!(cache_entries, quota_keys, usage_events, "runtime state cleared");
    Ok(Json(ClearResult {
        cleared: ClearedCounts {
            cache_entries,
            quota_keys,
            usage_events,
        },
    }))
}
