//! Request/response wire types for the forecast API contract.
//!
//! `ForecastRequest` is constructed once per inbound call and never mutated.
//! Free-form extras (`exog`, `constraints`) are `BTreeMap`-backed so the
//! canonical encoding used for cache keys does not depend on arrival order.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::{Validate, ValidationError};

/// Expected spacing of a time series. Wire codes: `D`, `W`, `M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Day,
    Week,
    Month,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Day => "D",
            Frequency::Week => "W",
            Frequency::Month => "M",
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" => Ok(Frequency::Day),
            "W" => Ok(Frequency::Week),
            "M" => Ok(Frequency::Month),
            other => Err(format!("freq must be one of D, W, M, got '{other}'")),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Model preference hint. Defaults to `auto` when absent or null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelHint {
    #[default]
    Auto,
    Dummy,
    Sarima,
    Prophet,
    Xgboost,
}

impl ModelHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelHint::Auto => "auto",
            ModelHint::Dummy => "dummy",
            ModelHint::Sarima => "sarima",
            ModelHint::Prophet => "prophet",
            ModelHint::Xgboost => "xgboost",
        }
    }
}

impl FromStr for ModelHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(ModelHint::Auto),
            "dummy" => Ok(ModelHint::Dummy),
            "sarima" => Ok(ModelHint::Sarima),
            "prophet" => Ok(ModelHint::Prophet),
            "xgboost" => Ok(ModelHint::Xgboost),
            other => Err(format!(
                "model_hint must be one of auto, dummy, sarima, prophet, xgboost, got '{other}'"
            )),
        }
    }
}

impl Serialize for ModelHint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModelHint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Explicit null is treated the same as an absent field.
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(ModelHint::Auto),
            Some(raw) => raw.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A single observed data point: ISO date (or datetime) and value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedPoint {
    pub ds: String,
    pub y: f64,
}

/// Parse an observation timestamp into a calendar date.
///
/// Accepts plain dates (`2025-01-31`) and ISO datetimes
/// (`2025-01-31T08:30:00`), taking the date part.
pub fn parse_ds(ds: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(ds, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDateTime::parse_from_str(ds, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(ds, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|dt| dt.date())
        .ok()
}

fn validate_observations(points: &[ObservedPoint]) -> Result<(), ValidationError> {
    for point in points {
        if parse_ds(&point.ds).is_none() {
            let mut error = ValidationError::new("invalid_ds");
            error.message = Some(format!("'{}' is not an ISO date", point.ds).into());
            return Err(error);
        }
    }
    Ok(())
}

/// Request body for `POST /forecast`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForecastRequest {
    /// Unique identifier for the time series.
    #[validate(length(min = 1, message = "series_id must not be blank"))]
    pub series_id: String,

    /// Expected observation spacing.
    pub freq: Frequency,

    /// Number of future periods to forecast.
    #[validate(range(min = 1, max = 365, message = "horizon must be within 1..=365"))]
    pub horizon: u32,

    /// Historical observations, oldest first. An empty series is rejected by
    /// the pipeline, not by payload validation.
    #[validate(custom(function = "validate_observations"))]
    pub y: Vec<ObservedPoint>,

    /// Exogenous variables. Accepted and ignored by the engines, but part of
    /// the cached request identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exog: Option<Vec<BTreeMap<String, serde_json::Value>>>,

    /// Forecast constraints. Accepted and ignored, like `exog`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<BTreeMap<String, serde_json::Value>>,

    /// Model preference hint.
    #[serde(default)]
    pub model_hint: ModelHint,

    /// Scoring policy alignment. Accepted and ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
}

impl ForecastRequest {
    /// The last observation, if any. Observations are ordered oldest first.
    pub fn last_observation(&self) -> Option<&ObservedPoint> {
        self.y.last()
    }
}

/// A single forecast point with its uncertainty band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub ds: String,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Execution trace metadata attached to every response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastTrace {
    pub cache_hit: bool,
    pub runtime_ms: u64,
    pub quota_remaining: u32,
}

/// Response body for `POST /forecast`.
///
/// A returned response always carries a freshly generated `request_id`, even
/// when served from cache, so two calls never share a traceable identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub request_id: String,
    pub model_used: String,
    pub routing_reason: String,
    pub forecast: Vec<ForecastPoint>,
    pub metrics: BTreeMap<String, f64>,
    pub trace: ForecastTrace,
}

/// Engine metadata for `GET /models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub description: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_request_json() -> serde_json::Value {
        serde_json::json!({
            "series_id": "demand-eu-1",
            "freq": "D",
            "horizon": 7,
            "y": [{"ds": "2025-01-01", "y": 100.0}],
        })
    }

    #[test]
    fn test_optional_fields_default() {
        let request: ForecastRequest =
            serde_json::from_value(minimal_request_json()).expect("minimal payload deserializes");
        assert_eq!(request.model_hint, ModelHint::Auto);
        assert!(request.exog.is_none());
        assert!(request.constraints.is_none());
        assert!(request.policy_id.is_none());
    }

    #[test]
    fn test_null_model_hint_is_auto() {
        let mut payload = minimal_request_json();
        payload["model_hint"] = serde_json::Value::Null;
        let request: ForecastRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(request.model_hint, ModelHint::Auto);
    }

    #[test]
    fn test_freq_is_case_insensitive() {
        let mut payload = minimal_request_json();
        payload["freq"] = "d".into();
        let request: ForecastRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(request.freq, Frequency::Day);
    }

    #[test]
    fn test_invalid_freq_rejected() {
        let mut payload = minimal_request_json();
        payload["freq"] = "X".into();
        assert!(serde_json::from_value::<ForecastRequest>(payload).is_err());
    }

    #[test]
    fn test_invalid_hint_rejected() {
        let mut payload = minimal_request_json();
        payload["model_hint"] = "lstm".into();
        assert!(serde_json::from_value::<ForecastRequest>(payload).is_err());
    }

    #[test]
    fn test_horizon_bounds_validated() {
        for horizon in [0u32, 999] {
            let mut payload = minimal_request_json();
            payload["horizon"] = horizon.into();
            let request: ForecastRequest = serde_json::from_value(payload).unwrap();
            assert!(request.validate().is_err(), "horizon {horizon} should fail");
        }
    }

    #[test]
    fn test_empty_series_passes_validation() {
        // Empty `y` is a pipeline-level rejection, not a 422.
        let mut payload = minimal_request_json();
        payload["y"] = serde_json::json!([]);
        let request: ForecastRequest = serde_json::from_value(payload).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_unparseable_ds_fails_validation() {
        let mut payload = minimal_request_json();
        payload["y"] = serde_json::json!([{"ds": "yesterday", "y": 1.0}]);
        let request: ForecastRequest = serde_json::from_value(payload).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_parse_ds_accepts_datetimes() {
        assert_eq!(
            parse_ds("2025-06-01T08:30:00"),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(parse_ds("2025-06-01"), NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(parse_ds("not-a-date"), None);
    }
}
