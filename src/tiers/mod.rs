//! Tier registry: named bundles of quota, horizon limit, and permitted
//! models.
//!
//! The table is built once at startup from configuration and held as an
//! `Arc` snapshot behind a `RwLock`. Reads clone small policies out of the
//! current snapshot; administrative updates (and tests) swap the whole
//! table atomically, so readers never observe a partially applied change.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use parking_lot::RwLock;
use serde::Serialize;

use crate::{
    config::TiersConfig,
    error::PipelineError,
};

/// Policy bundle for one tier. Read-only after construction.
#[derive(Debug, Clone, Serialize)]
pub struct TierPolicy {
    /// Lowercase tier name, also the serialized `tier` field.
    #[serde(rename = "tier")]
    pub name: String,
    pub daily_quota: u32,
    pub max_horizon: u32,
    pub allowed_models: BTreeSet<String>,
}

impl TierPolicy {
    pub fn allows(&self, model_id: &str) -> bool {
        self.allowed_models.contains(model_id)
    }
}

/// The full tier table. Swapped wholesale on reconfiguration.
#[derive(Debug, Clone)]
pub struct TierTable {
    default_tier: String,
    tiers: BTreeMap<String, TierPolicy>,
}

impl TierTable {
    /// Build a table from configuration. Tier names are lowercased; a
    /// default tier that names no configured tier falls back to the first
    /// tier in name order.
    pub fn from_config(config: &TiersConfig) -> Self {
        let tiers: BTreeMap<String, TierPolicy> = config
            .tiers
            .iter()
            .map(|(name, policy)| {
                let name = name.trim().to_ascii_lowercase();
                (
                    name.clone(),
                    TierPolicy {
                        name,
                        daily_quota: policy.daily_quota,
                        max_horizon: policy.max_horizon,
                        allowed_models: policy.allowed_models.iter().cloned().collect(),
                    },
                )
            })
            .collect();

        let configured_default = config.default_tier.trim().to_ascii_lowercase();
        let default_tier = if tiers.contains_key(&configured_default) {
            configured_default
        } else {
            tiers.keys().next().cloned().unwrap_or_default()
        };

        Self {
            default_tier,
            tiers,
        }
    }
}

/// Process-wide tier registry.
pub struct TierRegistry {
    table: RwLock<Arc<TierTable>>,
}

impl TierRegistry {
    pub fn new(table: TierTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    pub fn from_config(config: &TiersConfig) -> Self {
        Self::new(TierTable::from_config(config))
    }

    /// Resolve a tier by name. Case-insensitive; blank or absent resolves
    /// to the default tier.
    pub fn resolve(&self, name: Option<&str>) -> Result<TierPolicy, PipelineError> {
        let table = self.snapshot();
        let requested = name.unwrap_or_default().trim().to_ascii_lowercase();
        let effective = if requested.is_empty() {
            table.default_tier.as_str()
        } else {
            requested.as_str()
        };

        table
            .tiers
            .get(effective)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownTier(effective.to_string()))
    }

    /// Whether `model_id` is permitted for the named tier. Unknown tiers
    /// permit nothing.
    pub fn is_model_allowed(&self, tier_name: &str, model_id: &str) -> bool {
        self.resolve(Some(tier_name))
            .map(|policy| policy.allows(model_id))
            .unwrap_or(false)
    }

    /// The default tier name.
    pub fn default_tier(&self) -> String {
        self.snapshot().default_tier.clone()
    }

    /// All policies sorted by tier name, for introspection endpoints.
    pub fn list_all(&self) -> Vec<TierPolicy> {
        self.snapshot().tiers.values().cloned().collect()
    }

    /// Atomically replace the whole table (administrative path).
    pub fn replace(&self, table: TierTable) {
        *self.table.write() = Arc::new(table);
    }

    fn snapshot(&self) -> Arc<TierTable> {
        Arc::clone(&self.table.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TierPolicyConfig;

    fn registry() -> TierRegistry {
        TierRegistry::from_config(&TiersConfig::default())
    }

    #[test]
    fn test_blank_name_resolves_default() {
        let registry = registry();
        assert_eq!(registry.resolve(None).unwrap().name, "standard");
        assert_eq!(registry.resolve(Some("")).unwrap().name, "standard");
        assert_eq!(registry.resolve(Some("   ")).unwrap().name, "standard");
    }

    #[test]
    fn test_resolution_is_case_insensitive() {
        let registry = registry();
        assert_eq!(registry.resolve(Some("DEMO")).unwrap().name, "demo");
        assert_eq!(registry.resolve(Some(" Premium ")).unwrap().name, "premium");
    }

    #[test]
    fn test_unknown_tier_fails() {
        let registry = registry();
        let error = registry.resolve(Some("platinum")).unwrap_err();
        assert!(matches!(error, PipelineError::UnknownTier(name) if name == "platinum"));
    }

    #[test]
    fn test_model_gating() {
        let registry = registry();
        assert!(registry.is_model_allowed("demo", "dummy_v0"));
        assert!(!registry.is_model_allowed("demo", "xgboost_v0"));
        assert!(registry.is_model_allowed("premium", "xgboost_v0"));
        assert!(!registry.is_model_allowed("platinum", "dummy_v0"));
    }

    #[test]
    fn test_list_all_sorted_by_name() {
        let names: Vec<String> = registry()
            .list_all()
            .into_iter()
            .map(|policy| policy.name)
            .collect();
        assert_eq!(names, vec!["demo", "premium", "standard"]);
    }

    #[test]
    fn test_missing_default_falls_back_to_first() {
        let config = TiersConfig {
            default_tier: "enterprise".to_string(),
            tiers: BTreeMap::from([(
                "basic".to_string(),
                TierPolicyConfig {
                    daily_quota: 10,
                    max_horizon: 30,
                    allowed_models: vec!["dummy_v0".to_string()],
                },
            )]),
        };
        let registry = TierRegistry::from_config(&config);
        assert_eq!(registry.default_tier(), "basic");
    }

    #[test]
    fn test_replace_swaps_whole_table() {
        let registry = registry();
        let config = TiersConfig {
            default_tier: "trial".to_string(),
            tiers: BTreeMap::from([(
                "trial".to_string(),
                TierPolicyConfig {
                    daily_quota: 1,
                    max_horizon: 7,
                    allowed_models: vec!["dummy_v0".to_string()],
                },
            )]),
        };
        registry.replace(TierTable::from_config(&config));

        assert_eq!(registry.default_tier(), "trial");
        assert!(registry.resolve(Some("standard")).is_err());
        assert_eq!(registry.resolve(None).unwrap().daily_quota, 1);
    }
}
