//! The forecast request pipeline.
//!
//! A strict stage sequence, terminal at the first failure: tier resolution,
//! horizon check, quota check, cache lookup, routing + model authorization,
//! engine execution, cache write, telemetry append, response assembly. Data
//! flows forward only; no stage depends on a later stage's state, and a
//! rejected request mutates nothing beyond the quota slot it was admitted
//! through.

use std::{collections::BTreeMap, sync::Arc, time::Instant};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    api_types::{ForecastRequest, ForecastResponse, ForecastTrace},
    cache::{ForecastCache, cache_key},
    config::{CacheConfig, RoutingConfig},
    engines::EngineRegistry,
    error::PipelineError,
    quota::QuotaLimiter,
    routing::route_model,
    telemetry::{UsageEvent, UsageStore},
    tiers::TierRegistry,
};

/// Caller identity delivered out-of-band by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Tier name; blank or absent resolves to the default tier.
    pub tier: Option<String>,
    /// Client identifier; blank or absent falls back to `anonymous`.
    pub client_id: Option<String>,
}

impl RequestContext {
    fn client_id(&self) -> &str {
        match self.client_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id,
            _ => "anonymous",
        }
    }
}

/// End-to-end orchestrator. Holds every shared service as an explicit
/// handle so tests can build isolated instances per case.
pub struct ForecastPipeline {
    tiers: Arc<TierRegistry>,
    quota: Arc<QuotaLimiter>,
    cache: Arc<ForecastCache>,
    telemetry: Arc<dyn UsageStore>,
    engines: Arc<EngineRegistry>,
    routing: RoutingConfig,
    cache_enabled: bool,
}

impl ForecastPipeline {
    pub fn new(
        tiers: Arc<TierRegistry>,
        quota: Arc<QuotaLimiter>,
        cache: Arc<ForecastCache>,
        telemetry: Arc<dyn UsageStore>,
        engines: Arc<EngineRegistry>,
        routing: RoutingConfig,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            tiers,
            quota,
            cache,
            telemetry,
            engines,
            routing,
            cache_enabled: cache_config.enabled,
        }
    }

    /// Run one request through the pipeline.
    #[tracing::instrument(
        name = "pipeline.handle",
        skip(self, request, ctx),
        fields(series_id = %request.series_id, client_id = %ctx.client_id())
    )]
    pub async fn handle(
        &self,
        request: ForecastRequest,
        ctx: RequestContext,
    ) -> Result<ForecastResponse, PipelineError> {
        let started = Instant::now();

        // Zero observations never reach tier, quota, or routing stages.
        if request.y.is_empty() {
            return Err(PipelineError::EmptySeries);
        }

        let tier = self.tiers.resolve(ctx.tier.as_deref())?;

        if request.horizon > tier.max_horizon {
            return Err(PipelineError::TierHorizonExceeded {
                tier: tier.name,
                horizon: request.horizon,
                max_horizon: tier.max_horizon,
            });
        }

        let quota_key = format!("{}:{}", ctx.client_id(), tier.name);
        let decision = self
            .quota
            .allow(&quota_key, tier.daily_quota, Utc::now().date_naive());
        if !decision.permitted {
            return Err(PipelineError::QuotaExceeded {
                key: quota_key,
                limit: tier.daily_quota,
            });
        }

        let key = cache_key(&request);
        if self.cache_enabled
            && let Some(mut cached) = self.cache.get(&key)
        {
            // Served from cache: fresh request id, no model compute, but the
            // pipeline overhead and this call's quota slot are reported.
            cached.request_id = Uuid::new_v4().to_string();
            cached.metrics.insert("model_runtime_ms".to_string(), 0.0);
            let runtime_ms = started.elapsed().as_millis() as u64;
            cached.trace = ForecastTrace {
                cache_hit: true,
                runtime_ms,
                quota_remaining: decision.remaining,
            };
            self.record_usage(&request, &cached.model_used, true, runtime_ms)
                .await;
            tracing::debug!(model = %cached.model_used, "forecast served from cache");
            return Ok(cached);
        }

        let routed = route_model(&request, &self.routing);
        if !tier.allows(routed.model) {
            // Decision computed but execution refused: no cache write, no
            // usage event.
            return Err(PipelineError::ModelNotAllowedForTier {
                model: routed.model.to_string(),
                tier: tier.name,
            });
        }

        let engine =
            self.engines
                .get(routed.model)
                .ok_or_else(|| PipelineError::ModelExecution(format!(
                    "no engine registered for '{}'",
                    routed.model
                )))?;

        let model_started = Instant::now();
        let engine_request = request.clone();
        let output = tokio::task::spawn_blocking(move || engine.forecast(&engine_request))
            .await
            .map_err(|error| PipelineError::ModelExecution(error.to_string()))?;
        let model_runtime_ms = model_started.elapsed().as_millis() as u64;

        let mut metrics: BTreeMap<String, f64> = output.metrics;
        metrics.insert("model_runtime_ms".to_string(), model_runtime_ms as f64);

        let runtime_ms = started.elapsed().as_millis() as u64;
        let response = ForecastResponse {
            request_id: Uuid::new_v4().to_string(),
            model_used: routed.model.to_string(),
            routing_reason: routed.reason.to_string(),
            forecast: output.points,
            metrics,
            trace: ForecastTrace {
                cache_hit: false,
                runtime_ms,
                quota_remaining: decision.remaining,
            },
        };

        if self.cache_enabled {
            self.cache.set(&key, &response);
        }
        self.record_usage(&request, routed.model, false, runtime_ms)
            .await;

        tracing::info!(
            model = %routed.model,
            reason = %routed.reason,
            runtime_ms,
            "forecast computed"
        );
        Ok(response)
    }

    /// Telemetry is best-effort relative to answering the caller: a failed
    /// append loses that one event, never the response.
    async fn record_usage(
        &self,
        request: &ForecastRequest,
        model_used: &str,
        cache_hit: bool,
        runtime_ms: u64,
    ) {
        let event = UsageEvent {
            ts: Utc::now().to_rfc3339(),
            series_id: request.series_id.clone(),
            model_used: model_used.to_string(),
            cache_hit,
            runtime_ms: runtime_ms as i64,
        };
        if let Err(error) = self.telemetry.append(event).await {
            tracing::warn!(series_id = %request.series_id, %error, "failed to record usage event");
        }
    }
}
