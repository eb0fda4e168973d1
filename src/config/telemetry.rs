use serde::{Deserialize, Serialize};

/// Usage telemetry store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// SQLite database location. A plain path is opened with
    /// `create_if_missing`; a `sqlite:` URI is passed through verbatim
    /// (useful for shared in-memory databases in tests).
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Retention bound: after each append, only the most recently inserted
    /// `max_items` events are kept.
    #[serde(default = "default_max_items")]
    pub max_items: u32,

    /// Use WAL journaling. Disable for in-memory test databases.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How many quota keys the runtime status endpoint reports.
    #[serde(default = "default_quota_top_n")]
    pub quota_top_n: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_items: default_max_items(),
            wal_mode: default_wal_mode(),
            quota_top_n: default_quota_top_n(),
        }
    }
}

fn default_db_path() -> String {
    "data/usage.sqlite3".to_string()
}

fn default_max_items() -> u32 {
    10_000
}

fn default_wal_mode() -> bool {
    true
}

fn default_quota_top_n() -> usize {
    10
}
