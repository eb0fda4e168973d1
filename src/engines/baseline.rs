//! Flat baseline engine.

use std::collections::BTreeMap;

use super::{DUMMY_V0, Engine, EngineOutput, future_dates, round4};
use crate::api_types::{ForecastPoint, ForecastRequest, parse_ds};

/// Repeats the last observed value with a ±10% band. Deterministic and
/// fit-free, so it is both the shortest routing path and the fallback every
/// other engine degrades to.
pub struct BaselineEngine;

impl Engine for BaselineEngine {
    fn id(&self) -> &'static str {
        DUMMY_V0
    }

    fn describe(&self) -> &'static str {
        "Flat baseline: repeats the last observed value with a ±10% band"
    }

    fn forecast(&self, request: &ForecastRequest) -> EngineOutput {
        flat_forecast(request, BTreeMap::new())
    }
}

/// The flat baseline, reusable as an internal fallback: callers pass the
/// metrics they want attached (e.g. `fallback = 1`).
pub(crate) fn flat_forecast(
    request: &ForecastRequest,
    metrics: BTreeMap<String, f64>,
) -> EngineOutput {
    let Some(last) = request.last_observation() else {
        return EngineOutput {
            points: Vec::new(),
            metrics,
        };
    };

    let baseline = last.y;
    let last_date = parse_ds(&last.ds).unwrap_or_default();
    let lower = round4((baseline * 0.9).min(baseline * 1.1));
    let upper = round4((baseline * 0.9).max(baseline * 1.1));

    let points = future_dates(last_date, request.freq, request.horizon)
        .into_iter()
        .map(|ds| ForecastPoint {
            ds,
            yhat: round4(baseline),
            yhat_lower: lower,
            yhat_upper: upper,
        })
        .collect();

    EngineOutput { points, metrics }
}
