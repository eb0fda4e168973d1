//! Trend/seasonal statistical engine (`sarima_v0`).

use std::collections::BTreeMap;

use super::{
    Engine, EngineOutput, SARIMA_V0,
    baseline::flat_forecast,
    fitted::{CONFIDENCE, band_points, ets_forecast},
};
use crate::api_types::ForecastRequest;

/// Fewest observations worth fitting a model to.
pub(crate) const MIN_FIT_OBS: usize = 7;

/// Trend model over the full history: AutoETS with prediction intervals.
/// Degrades to the flat baseline when the series is too short or the fit
/// fails.
pub struct TrendEngine;

impl Engine for TrendEngine {
    fn id(&self) -> &'static str {
        SARIMA_V0
    }

    fn describe(&self) -> &'static str {
        "Trend model: automatic exponential smoothing over the full history"
    }

    fn forecast(&self, request: &ForecastRequest) -> EngineOutput {
        let values: Vec<f64> = request.y.iter().map(|point| point.y).collect();
        if values.len() < MIN_FIT_OBS {
            return flat_forecast(request, fallback_metrics(values.len()));
        }

        match ets_forecast(&values, request.horizon as usize) {
            Ok(forecast) => EngineOutput {
                points: band_points(request, &forecast),
                metrics: BTreeMap::from([
                    ("obs_used".to_string(), values.len() as f64),
                    ("confidence".to_string(), CONFIDENCE),
                ]),
            },
            Err(error) => {
                tracing::warn!(series_id = %request.series_id, %error, "trend fit failed, using baseline");
                flat_forecast(request, fallback_metrics(values.len()))
            }
        }
    }
}

pub(crate) fn fallback_metrics(obs_used: usize) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("obs_used".to_string(), obs_used as f64),
        ("fallback".to_string(), 1.0),
    ])
}

#[cfg(test)]
mod tests {
    use super::{super::test_support::daily_request, *};

    #[test]
    fn test_produces_horizon_points() {
        let request = daily_request(30, 14);
        let output = TrendEngine.forecast(&request);

        assert_eq!(output.points.len(), 14);
        assert_eq!(output.metrics.get("obs_used"), Some(&30.0));
        assert!(!output.metrics.contains_key("fallback"));
        for point in &output.points {
            assert!(point.yhat_lower <= point.yhat);
            assert!(point.yhat <= point.yhat_upper);
        }
    }

    #[test]
    fn test_dates_are_daily_and_after_last_observation() {
        let request = daily_request(30, 3);
        let output = TrendEngine.forecast(&request);

        // Last observation is 2025-01-30.
        let dates: Vec<&str> = output.points.iter().map(|p| p.ds.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-31", "2025-02-01", "2025-02-02"]);
    }

    #[test]
    fn test_short_series_falls_back_to_baseline() {
        let request = daily_request(3, 5);
        let output = TrendEngine.forecast(&request);

        assert_eq!(output.points.len(), 5);
        assert_eq!(output.metrics.get("fallback"), Some(&1.0));
        let last = request.last_observation().unwrap().y;
        assert_eq!(output.points[0].yhat, last);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let request = daily_request(40, 7);
        let first = TrendEngine.forecast(&request);
        let second = TrendEngine.forecast(&request);
        assert_eq!(first.points, second.points);
    }
}
