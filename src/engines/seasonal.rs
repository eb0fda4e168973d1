//! Seasonal decomposition engine (`prophet_v0`).

use std::collections::BTreeMap;

use super::{
    Engine, EngineOutput, PROPHET_V0,
    baseline::flat_forecast,
    fitted::{CONFIDENCE, band_points, ets_forecast, mstl_forecast},
    trend::{MIN_FIT_OBS, fallback_metrics},
};
use crate::api_types::{ForecastRequest, Frequency};

/// Weekly seasonality period for daily series.
const WEEKLY_PERIOD: usize = 7;

/// Need at least two full seasonal cycles before decomposition is sound.
const MIN_SEASONAL_OBS: usize = 2 * WEEKLY_PERIOD;

/// Explicit seasonality: MSTL decomposition with an AutoETS trend model for
/// daily series with enough history, plain AutoETS otherwise. Degrades to
/// the flat baseline on short series or fit failure.
pub struct SeasonalEngine;

impl Engine for SeasonalEngine {
    fn id(&self) -> &'static str {
        PROPHET_V0
    }

    fn describe(&self) -> &'static str {
        "Seasonal model: MSTL weekly decomposition over an exponential-smoothing trend"
    }

    fn forecast(&self, request: &ForecastRequest) -> EngineOutput {
        let values: Vec<f64> = request.y.iter().map(|point| point.y).collect();
        if values.len() < MIN_FIT_OBS {
            return flat_forecast(request, fallback_metrics(values.len()));
        }

        let seasonal = request.freq == Frequency::Day && values.len() >= MIN_SEASONAL_OBS;
        let horizon = request.horizon as usize;
        let fit = if seasonal {
            mstl_forecast(&values, WEEKLY_PERIOD, horizon)
        } else {
            ets_forecast(&values, horizon)
        };

        match fit {
            Ok(forecast) => EngineOutput {
                points: band_points(request, &forecast),
                metrics: BTreeMap::from([
                    ("obs_used".to_string(), values.len() as f64),
                    ("confidence".to_string(), CONFIDENCE),
                    ("seasonal".to_string(), if seasonal { 1.0 } else { 0.0 }),
                ]),
            },
            Err(error) => {
                tracing::warn!(series_id = %request.series_id, %error, "seasonal fit failed, using baseline");
                flat_forecast(request, fallback_metrics(values.len()))
            }
        }
    }
}
