use serde::{Deserialize, Serialize};

/// Model routing configuration: which engines are eligible and the
/// thresholds the auto heuristics compare against.
///
/// With the defaults: short-horizon dense daily series go to the
/// gradient-boosted proxy, long daily horizons with ample history to
/// seasonal decomposition, anything with a trend's worth of data to the
/// statistical model, and the rest to the flat baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    #[serde(default = "default_true")]
    pub enable_sarima: bool,

    #[serde(default = "default_true")]
    pub enable_prophet: bool,

    #[serde(default = "default_true")]
    pub enable_xgboost: bool,

    /// Minimum observations before the trend model is considered.
    #[serde(default = "default_sarima_min_obs")]
    pub sarima_min_obs: usize,

    /// Minimum observations before seasonal decomposition is considered.
    #[serde(default = "default_prophet_min_obs")]
    pub prophet_min_obs: usize,

    /// Minimum horizon for seasonal decomposition to pay off.
    #[serde(default = "default_prophet_min_horizon")]
    pub prophet_min_horizon: u32,

    /// Minimum observations before the gradient-boosted proxy is considered.
    #[serde(default = "default_xgboost_min_obs")]
    pub xgboost_min_obs: usize,

    /// Maximum horizon the gradient-boosted proxy is trusted for.
    #[serde(default = "default_xgboost_max_horizon")]
    pub xgboost_max_horizon: u32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enable_sarima: true,
            enable_prophet: true,
            enable_xgboost: true,
            sarima_min_obs: default_sarima_min_obs(),
            prophet_min_obs: default_prophet_min_obs(),
            prophet_min_horizon: default_prophet_min_horizon(),
            xgboost_min_obs: default_xgboost_min_obs(),
            xgboost_max_horizon: default_xgboost_max_horizon(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sarima_min_obs() -> usize {
    24
}

fn default_prophet_min_obs() -> usize {
    60
}

fn default_prophet_min_horizon() -> u32 {
    21
}

fn default_xgboost_min_obs() -> usize {
    90
}

fn default_xgboost_max_horizon() -> u32 {
    14
}
