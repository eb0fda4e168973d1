//! Short-range dense-series engine (`xgboost_v0`).

use std::collections::BTreeMap;

use super::{
    Engine, EngineOutput, XGBOOST_V0,
    baseline::flat_forecast,
    fitted::{CONFIDENCE, band_points, ets_forecast},
    trend::{MIN_FIT_OBS, fallback_metrics},
};
use crate::api_types::ForecastRequest;

/// Trailing observations used for the short-range fit. Older history adds
/// little for the horizons this engine is routed.
const WINDOW: usize = 90;

/// Short-range autocorrelation proxy: fits on a trailing window of recent
/// observations only, which keeps the fit cheap on dense series and biases
/// it toward recent level shifts. Degrades to the flat baseline on short
/// series or fit failure.
pub struct ShortRangeEngine;

impl Engine for ShortRangeEngine {
    fn id(&self) -> &'static str {
        XGBOOST_V0
    }

    fn describe(&self) -> &'static str {
        "Short-range model: exponential smoothing over a trailing window of recent observations"
    }

    fn forecast(&self, request: &ForecastRequest) -> EngineOutput {
        let values: Vec<f64> = request.y.iter().map(|point| point.y).collect();
        if values.len() < MIN_FIT_OBS {
            return flat_forecast(request, fallback_metrics(values.len()));
        }

        let window_start = values.len().saturating_sub(WINDOW);
        let window = &values[window_start..];

        match ets_forecast(window, request.horizon as usize) {
            Ok(forecast) => EngineOutput {
                points: band_points(request, &forecast),
                metrics: BTreeMap::from([
                    ("obs_used".to_string(), values.len() as f64),
                    ("window".to_string(), window.len() as f64),
                    ("confidence".to_string(), CONFIDENCE),
                ]),
            },
            Err(error) => {
                tracing::warn!(series_id = %request.series_id, %error, "short-range fit failed, using baseline");
                flat_forecast(request, fallback_metrics(values.len()))
            }
        }
    }
}
