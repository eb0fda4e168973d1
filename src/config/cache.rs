use serde::{Deserialize, Serialize};

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Enable response caching.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Cache TTL in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of cached responses held in memory.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    900 // 15 minutes
}

fn default_max_entries() -> usize {
    10_000
}
