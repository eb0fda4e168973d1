use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engines;

/// Tier table configuration.
///
/// The defaults ship three tiers. `standard` is the default tier applied
/// when a request carries no tier name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TiersConfig {
    /// Tier applied when the request names none.
    #[serde(default = "default_tier_name")]
    pub default_tier: String,

    /// Tier name (lowercase) to policy.
    #[serde(default = "default_tier_table")]
    pub tiers: BTreeMap<String, TierPolicyConfig>,
}

/// Per-tier policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierPolicyConfig {
    /// Calls allowed per client per UTC day.
    pub daily_quota: u32,

    /// Largest forecast horizon the tier may request.
    pub max_horizon: u32,

    /// Model identifiers the tier may execute.
    pub allowed_models: Vec<String>,
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            default_tier: default_tier_name(),
            tiers: default_tier_table(),
        }
    }
}

fn default_tier_name() -> String {
    "standard".to_string()
}

fn default_tier_table() -> BTreeMap<String, TierPolicyConfig> {
    BTreeMap::from([
        (
            "demo".to_string(),
            TierPolicyConfig {
                daily_quota: 25,
                max_horizon: 14,
                allowed_models: vec![
                    engines::DUMMY_V0.to_string(),
                    engines::SARIMA_V0.to_string(),
                ],
            },
        ),
        (
            "standard".to_string(),
            TierPolicyConfig {
                daily_quota: 200,
                max_horizon: 90,
                allowed_models: vec![
                    engines::DUMMY_V0.to_string(),
                    engines::SARIMA_V0.to_string(),
                    engines::PROPHET_V0.to_string(),
                ],
            },
        ),
        (
            "premium".to_string(),
            TierPolicyConfig {
                daily_quota: 1000,
                max_horizon: 365,
                allowed_models: vec![
                    engines::DUMMY_V0.to_string(),
                    engines::SARIMA_V0.to_string(),
                    engines::PROPHET_V0.to_string(),
                    engines::XGBOOST_V0.to_string(),
                ],
            },
        ),
    ])
}
