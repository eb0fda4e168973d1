//! Forecasting engines.
//!
//! Each engine is an opaque strategy behind the [`Engine`] trait: it takes
//! a request and returns exactly `horizon` points dated strictly after the
//! last observation, plus free-form numeric metrics. Engines never fail
//! from the pipeline's point of view; a strategy that cannot fit its model
//! falls back internally to the flat baseline and says so in its metrics.

mod baseline;
mod boosted;
mod fitted;
mod seasonal;
mod trend;

use std::{collections::BTreeMap, sync::Arc};

pub use baseline::BaselineEngine;
pub use boosted::ShortRangeEngine;
use chrono::{Months, NaiveDate};
pub use seasonal::SeasonalEngine;
pub use trend::TrendEngine;

use crate::{
    api_types::{ForecastPoint, ForecastRequest, Frequency, ModelInfo},
    config::RoutingConfig,
};

pub const DUMMY_V0: &str = "dummy_v0";
pub const SARIMA_V0: &str = "sarima_v0";
pub const PROPHET_V0: &str = "prophet_v0";
pub const XGBOOST_V0: &str = "xgboost_v0";

/// What an engine hands back to the pipeline.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub points: Vec<ForecastPoint>,
    pub metrics: BTreeMap<String, f64>,
}

/// A forecasting strategy. Total: always produces an output.
pub trait Engine: Send + Sync {
    fn id(&self) -> &'static str;

    fn describe(&self) -> &'static str;

    fn forecast(&self, request: &ForecastRequest) -> EngineOutput;
}

/// Registry of the engines this process can execute.
pub struct EngineRegistry {
    engines: BTreeMap<&'static str, Arc<dyn Engine>>,
}

impl EngineRegistry {
    /// The standard engine set.
    pub fn standard() -> Self {
        let engines: Vec<Arc<dyn Engine>> = vec![
            Arc::new(BaselineEngine),
            Arc::new(TrendEngine),
            Arc::new(SeasonalEngine),
            Arc::new(ShortRangeEngine),
        ];
        Self {
            engines: engines.into_iter().map(|e| (e.id(), e)).collect(),
        }
    }

    pub fn get(&self, model_id: &str) -> Option<Arc<dyn Engine>> {
        self.engines.get(model_id).cloned()
    }

    /// Catalog for the `/models` endpoint. The baseline is always active;
    /// the other engines report their routing-config eligibility.
    pub fn catalog(&self, routing: &RoutingConfig) -> Vec<ModelInfo> {
        self.engines
            .values()
            .map(|engine| {
                let enabled = match engine.id() {
                    SARIMA_V0 => routing.enable_sarima,
                    PROPHET_V0 => routing.enable_prophet,
                    XGBOOST_V0 => routing.enable_xgboost,
                    _ => true,
                };
                ModelInfo {
                    model_id: engine.id().to_string(),
                    description: engine.describe().to_string(),
                    status: if enabled { "active" } else { "disabled" }.to_string(),
                }
            })
            .collect()
    }
}

/// Step a date forward by `steps` periods of the given frequency.
///
/// Monthly steps clamp the day to the target month's end (Jan 31 + 1mo =
/// Feb 28/29).
pub(crate) fn step_date(last: NaiveDate, freq: Frequency, steps: u32) -> NaiveDate {
    match freq {
        Frequency::Day => last + chrono::Duration::days(i64::from(steps)),
        Frequency::Week => last + chrono::Duration::days(7 * i64::from(steps)),
        Frequency::Month => last.checked_add_months(Months::new(steps)).unwrap_or(last),
    }
}

/// The `horizon` forecast dates following `last`, formatted as ISO dates.
pub(crate) fn future_dates(last: NaiveDate, freq: Frequency, horizon: u32) -> Vec<String> {
    (1..=horizon)
        .map(|step| step_date(last, freq, step).format("%Y-%m-%d").to_string())
        .collect()
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}


#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(Frequency::Day, 1, date(2025, 1, 2))]
    #[case(Frequency::Day, 30, date(2025, 1, 31))]
    #[case(Frequency::Week, 2, date(2025, 1, 15))]
    #[case(Frequency::Month, 1, date(2025, 2, 1))]
    fn test_step_date(#[case] freq: Frequency, #[case] steps: u32, #[case] expected: NaiveDate) {
        assert_eq!(step_date(date(2025, 1, 1), freq, steps), expected);
    }

    #[test]
    fn test_month_step_clamps_day() {
        assert_eq!(
            step_date(date(2025, 1, 31), Frequency::Month, 1),
            date(2025, 2, 28)
        );
        assert_eq!(
            step_date(date(2024, 1, 31), Frequency::Month, 1),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn test_future_dates_start_after_last() {
        let dates = future_dates(date(2025, 1, 10), Frequency::Day, 3);
        assert_eq!(dates, vec!["2025-01-11", "2025-01-12", "2025-01-13"]);
    }

    #[test]
    fn test_registry_has_all_engines() {
        let registry = EngineRegistry::standard();
        for id in [DUMMY_V0, SARIMA_V0, PROPHET_V0, XGBOOST_V0] {
            assert!(registry.get(id).is_some(), "missing engine {id}");
        }
        assert!(registry.get("lstm_v0").is_none());
    }

    #[test]
    fn test_catalog_reflects_routing_config() {
        let registry = EngineRegistry::standard();
        let routing = RoutingConfig {
            enable_xgboost: false,
            ..RoutingConfig::default()
        };
        let catalog = registry.catalog(&routing);

        let xgboost = catalog
            .iter()
            .find(|m| m.model_id == XGBOOST_V0)
            .expect("xgboost listed");
        assert_eq!(xgboost.status, "disabled");

        let dummy = catalog.iter().find(|m| m.model_id == DUMMY_V0).unwrap();
        assert_eq!(dummy.status, "active");
    }
}
