//! Gateway configuration.
//!
//! Loaded once at startup from a TOML file (or built from defaults when no
//! file is given). Every section has serde defaults so a partial file is
//! valid; unknown keys are rejected to catch typos early.

mod cache;
mod routing;
mod server;
mod telemetry;
mod tiers;

use std::path::Path;

pub use cache::CacheConfig;
pub use routing::RoutingConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
pub use telemetry::TelemetryConfig;
use thiserror::Error;
pub use tiers::{TierPolicyConfig, TiersConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub tiers: TiersConfig,
}

impl GatewayConfig {
    /// Parse configuration from a TOML string.
    pub fn from_str(raw: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tiers.tiers.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one tier must be configured".to_string(),
            ));
        }
        if self.telemetry.max_items == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.max_items must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GatewayConfig::from_str("").unwrap();
        assert_eq!(config.server.port, 8094);
        assert!(config.cache.enabled);
        assert_eq!(config.tiers.default_tier, "standard");
        assert!(config.tiers.tiers.contains_key("demo"));
    }

    #[test]
    fn test_partial_override() {
        let config = GatewayConfig::from_str(
            r#"
[server]
port = 9000

[routing]
enable_xgboost = false

[cache]
ttl_secs = 60
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(!config.routing.enable_xgboost);
        assert!(config.routing.enable_prophet);
        assert_eq!(config.cache.ttl_secs, 60);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = GatewayConfig::from_str("[server]\nprot = 9000\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_custom_tiers_replace_defaults() {
        let config = GatewayConfig::from_str(
            r#"
[tiers]
default_tier = "free"

[tiers.tiers.free]
daily_quota = 5
max_horizon = 7
allowed_models = ["dummy_v0"]
"#,
        )
        .unwrap();
        assert_eq!(config.tiers.default_tier, "free");
        assert_eq!(config.tiers.tiers.len(), 1);
    }

    #[test]
    fn test_empty_tier_table_rejected() {
        let result = GatewayConfig::from_str("[tiers]\ntiers = {}\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
