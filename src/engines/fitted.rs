//! Shared fitting plumbing for the statistical engines (augurs).

use augurs::{
    ets::AutoETS,
    forecaster::{Forecaster, transforms::LinearInterpolator},
    mstl::MSTLModel,
};

use super::{future_dates, round4};
use crate::api_types::{ForecastPoint, ForecastRequest, parse_ds};

/// Confidence level for prediction intervals.
pub(crate) const CONFIDENCE: f64 = 0.95;

/// Fit AutoETS (no seasonal decomposition) and predict `horizon` periods.
pub(crate) fn ets_forecast(values: &[f64], horizon: usize) -> Result<augurs::Forecast, String> {
    let ets = AutoETS::non_seasonal();
    let transformers: Vec<Box<dyn augurs::forecaster::Transformer>> =
        vec![Box::new(LinearInterpolator::default())];
    let mut forecaster = Forecaster::new(ets).with_transformers(transformers);

    forecaster
        .fit(values)
        .map_err(|e| format!("ETS fit error: {e}"))?;
    forecaster
        .predict(horizon, CONFIDENCE)
        .map_err(|e| format!("ETS predict error: {e}"))
}

/// Fit MSTL seasonal decomposition with an AutoETS trend model and predict
/// `horizon` periods.
pub(crate) fn mstl_forecast(
    values: &[f64],
    period: usize,
    horizon: usize,
) -> Result<augurs::Forecast, String> {
    let ets = AutoETS::non_seasonal().into_trend_model();
    let mstl = MSTLModel::new(vec![period], ets);
    let transformers: Vec<Box<dyn augurs::forecaster::Transformer>> =
        vec![Box::new(LinearInterpolator::default())];
    let mut forecaster = Forecaster::new(mstl).with_transformers(transformers);

    forecaster
        .fit(values)
        .map_err(|e| format!("MSTL fit error: {e}"))?;
    forecaster
        .predict(horizon, CONFIDENCE)
        .map_err(|e| format!("MSTL predict error: {e}"))
}

/// Turn a fitted forecast into dated points with an ordered uncertainty
/// band. When the model yields no intervals, the band falls back to ±20%
/// around the point estimate.
pub(crate) fn band_points(
    request: &ForecastRequest,
    forecast: &augurs::Forecast,
) -> Vec<ForecastPoint> {
    let last_date = request
        .last_observation()
        .and_then(|point| parse_ds(&point.ds))
        .unwrap_or_default();
    let dates = future_dates(last_date, request.freq, request.horizon);

    dates
        .into_iter()
        .enumerate()
        .map(|(i, ds)| {
            let yhat = forecast.point.get(i).copied().unwrap_or_default();
            let (lower, upper) = match &forecast.intervals {
                Some(intervals) => (
                    intervals.lower.get(i).copied().unwrap_or(yhat),
                    intervals.upper.get(i).copied().unwrap_or(yhat),
                ),
                None => (yhat - yhat.abs() * 0.2, yhat + yhat.abs() * 0.2),
            };
            ForecastPoint {
                ds,
                yhat: round4(yhat),
                yhat_lower: round4(lower.min(yhat)),
                yhat_upper: round4(upper.max(yhat)),
            }
        })
        .collect()
}
