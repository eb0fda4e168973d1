//! meridian: a tier-aware forecast gateway.
//!
//! Routes time-series forecast requests to one of several forecasting
//! engines, throttled by per-client daily quota, gated by subscription
//! tier, answered from a short-lived response cache when possible, and
//! recording durable usage telemetry.

use std::{sync::Arc, time::Duration};

use axum::Router;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

pub mod api_types;
pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod pipeline;
pub mod quota;
pub mod routes;
pub mod routing;
pub mod telemetry;
pub mod tiers;


use cache::ForecastCache;
use config::GatewayConfig;
use engines::EngineRegistry;
use pipeline::ForecastPipeline;
use quota::QuotaLimiter;
use telemetry::{SqliteUsageStore, StoreError, UsageStore};
use tiers::TierRegistry;

/// Shared service handles, constructed once at startup and cloned into
/// every request. No component lives in ambient global state, so tests can
/// build isolated instances per case.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub tiers: Arc<TierRegistry>,
    pub quota: Arc<QuotaLimiter>,
    pub cache: Arc<ForecastCache>,
    pub telemetry: Arc<dyn UsageStore>,
    pub engines: Arc<EngineRegistry>,
    pub pipeline: Arc<ForecastPipeline>,
}

impl AppState {
    /// Build every service from configuration. Opens (and bootstraps) the
    /// telemetry database.
    pub async fn new(config: GatewayConfig) -> Result<Self, StoreError> {
        let telemetry: Arc<dyn UsageStore> = Arc::new(
            SqliteUsageStore::open(
                &config.telemetry.db_path,
                config.telemetry.max_items,
                config.telemetry.wal_mode,
            )
            .await?,
        );

        let tiers = Arc::new(TierRegistry::from_config(&config.tiers));
        let quota = Arc::new(QuotaLimiter::new());
        let cache = Arc::new(ForecastCache::new(
            Duration::from_secs(config.cache.ttl_secs),
            config.cache.max_entries,
        ));
        let engines = Arc::new(EngineRegistry::standard());

        let pipeline = Arc::new(ForecastPipeline::new(
            Arc::clone(&tiers),
            Arc::clone(&quota),
            Arc::clone(&cache),
            Arc::clone(&telemetry),
            Arc::clone(&engines),
            config.routing.clone(),
            &config.cache,
        ));

        Ok(Self {
            config: Arc::new(config),
            tiers,
            quota,
            cache,
            telemetry,
            engines,
            pipeline,
        })
    }
}

/// Assemble the application router with its middleware stack.
pub fn build_app(config: &GatewayConfig, state: AppState) -> Router {
    routes::router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
}
