//! Model routing.
//!
//! A pure, deterministic, total decision procedure: given a request and the
//! routing configuration it always picks a model and a machine-readable
//! reason, and never fails. Explicit hints win over heuristics; a hint for
//! a disabled engine degrades to the baseline rather than erroring.

use crate::{
    api_types::{ForecastRequest, Frequency, ModelHint},
    config::RoutingConfig,
    engines::{DUMMY_V0, PROPHET_V0, SARIMA_V0, XGBOOST_V0},
};

/// The routed model and why it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    pub model: &'static str,
    pub reason: &'static str,
}

/// Route a request to a forecasting engine.
///
/// Decision order, first match wins:
/// 1. hint `dummy`: always the baseline;
/// 2. hint for a specific strategy: that engine when enabled, baseline
///    with a `_disabled` reason otherwise;
/// 3. auto heuristics: dense short-horizon daily series to the
///    gradient-boosted proxy, long daily horizons with ample history to
///    seasonal decomposition, anything with a trend's worth of data to the
///    trend model, the rest to the baseline.
pub fn route_model(request: &ForecastRequest, config: &RoutingConfig) -> RoutingDecision {
    match request.model_hint {
        ModelHint::Dummy => {
            return RoutingDecision {
                model: DUMMY_V0,
                reason: "hint_dummy",
            };
        }
        ModelHint::Sarima => {
            return if config.enable_sarima {
                RoutingDecision {
                    model: SARIMA_V0,
                    reason: "hint_sarima",
                }
            } else {
                RoutingDecision {
                    model: DUMMY_V0,
                    reason: "hint_sarima_disabled",
                }
            };
        }
        ModelHint::Prophet => {
            return if config.enable_prophet {
                RoutingDecision {
                    model: PROPHET_V0,
                    reason: "hint_prophet",
                }
            } else {
                RoutingDecision {
                    model: DUMMY_V0,
                    reason: "hint_prophet_disabled",
                }
            };
        }
        ModelHint::Xgboost => {
            return if config.enable_xgboost {
                RoutingDecision {
                    model: XGBOOST_V0,
                    reason: "hint_xgboost",
                }
            } else {
                RoutingDecision {
                    model: DUMMY_V0,
                    reason: "hint_xgboost_disabled",
                }
            };
        }
        ModelHint::Auto => {}
    }

    let observations = request.y.len();
    let daily = request.freq == Frequency::Day;

    if config.enable_xgboost
        && daily
        && observations >= config.xgboost_min_obs
        && request.horizon <= config.xgboost_max_horizon
    {
        return RoutingDecision {
            model: XGBOOST_V0,
            reason: "auto_short_horizon_dense_series",
        };
    }

    if config.enable_prophet
        && daily
        && observations >= config.prophet_min_obs
        && request.horizon >= config.prophet_min_horizon
    {
        return RoutingDecision {
            model: PROPHET_V0,
            reason: "auto_daily_long_with_history",
        };
    }

    if config.enable_sarima && observations >= config.sarima_min_obs {
        return RoutingDecision {
            model: SARIMA_V0,
            reason: "auto_trend_series",
        };
    }

    RoutingDecision {
        model: DUMMY_V0,
        reason: "auto_short_series",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::ObservedPoint;

    fn request(n_obs: usize, horizon: u32, hint: ModelHint) -> ForecastRequest {
        ForecastRequest {
            series_id: "routing-series".to_string(),
            freq: Frequency::Day,
            horizon,
            model_hint: hint,
            y: (0..n_obs)
                .map(|i| ObservedPoint {
                    ds: format!("2025-01-{:02}", (i % 28) + 1),
                    y: 100.0 + i as f64,
                })
                .collect(),
            exog: None,
            constraints: None,
            policy_id: None,
        }
    }

    fn config() -> RoutingConfig {
        RoutingConfig::default()
    }

    #[test]
    fn test_auto_routes_to_prophet_when_threshold_met() {
        let config = RoutingConfig {
            enable_xgboost: false,
            ..config()
        };
        let decision = route_model(&request(80, 30, ModelHint::Auto), &config);
        assert_eq!(decision.model, PROPHET_V0);
        assert_eq!(decision.reason, "auto_daily_long_with_history");
    }

    #[test]
    fn test_auto_routes_to_sarima_when_prophet_not_met() {
        let config = RoutingConfig {
            enable_xgboost: false,
            ..config()
        };
        let decision = route_model(&request(40, 14, ModelHint::Auto), &config);
        assert_eq!(decision.model, SARIMA_V0);
        assert_eq!(decision.reason, "auto_trend_series");
    }

    #[test]
    fn test_auto_routes_to_xgboost_when_threshold_met() {
        let config = RoutingConfig {
            prophet_min_obs: 200,
            prophet_min_horizon: 30,
            ..config()
        };
        let decision = route_model(&request(120, 10, ModelHint::Auto), &config);
        assert_eq!(decision.model, XGBOOST_V0);
        assert_eq!(decision.reason, "auto_short_horizon_dense_series");
    }

    #[test]
    fn test_auto_short_series_falls_back_to_baseline() {
        let decision = route_model(&request(5, 7, ModelHint::Auto), &config());
        assert_eq!(decision.model, DUMMY_V0);
        assert_eq!(decision.reason, "auto_short_series");
    }

    #[test]
    fn test_non_daily_series_skips_density_heuristics() {
        let mut req = request(120, 10, ModelHint::Auto);
        req.freq = Frequency::Week;
        let decision = route_model(&req, &config());
        assert_eq!(decision.model, SARIMA_V0);
        assert_eq!(decision.reason, "auto_trend_series");
    }

    #[test]
    fn test_hint_dummy_always_wins() {
        let decision = route_model(&request(120, 10, ModelHint::Dummy), &config());
        assert_eq!(decision.model, DUMMY_V0);
        assert_eq!(decision.reason, "hint_dummy");
    }

    #[test]
    fn test_hint_respects_disabled_model() {
        let config = RoutingConfig {
            enable_prophet: false,
            ..config()
        };
        let decision = route_model(&request(100, 30, ModelHint::Prophet), &config);
        assert_eq!(decision.model, DUMMY_V0);
        assert_eq!(decision.reason, "hint_prophet_disabled");
    }

    #[test]
    fn test_enabled_hint_bypasses_heuristics() {
        // Thresholds would pick xgboost; the hint overrides.
        let decision = route_model(&request(120, 10, ModelHint::Sarima), &config());
        assert_eq!(decision.model, SARIMA_V0);
        assert_eq!(decision.reason, "hint_sarima");
    }

    #[test]
    fn test_priority_when_all_thresholds_met() {
        // 120 daily observations, horizon 14: xgboost, prophet (with relaxed
        // thresholds), and sarima all qualify; priority must hold.
        let config = RoutingConfig {
            prophet_min_obs: 60,
            prophet_min_horizon: 14,
            ..config()
        };
        let req = request(120, 14, ModelHint::Auto);

        let decision = route_model(&req, &config);
        assert_eq!(decision.model, XGBOOST_V0);

        let without_xgboost = RoutingConfig {
            enable_xgboost: false,
            ..config.clone()
        };
        assert_eq!(route_model(&req, &without_xgboost).model, PROPHET_V0);

        let without_dense = RoutingConfig {
            enable_xgboost: false,
            enable_prophet: false,
            ..config.clone()
        };
        assert_eq!(route_model(&req, &without_dense).model, SARIMA_V0);

        let baseline_only = RoutingConfig {
            enable_xgboost: false,
            enable_prophet: false,
            enable_sarima: false,
            ..config
        };
        assert_eq!(route_model(&req, &baseline_only).model, DUMMY_V0);
    }

    #[test]
    fn test_routing_is_deterministic() {
        let req = request(80, 30, ModelHint::Auto);
        let config = config();
        let first = route_model(&req, &config);
        for _ in 0..10 {
            assert_eq!(route_model(&req, &config), first);
        }
    }
}
