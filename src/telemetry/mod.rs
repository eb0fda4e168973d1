//! Durable usage telemetry.
//!
//! Every completed forecast call (cache hit or miss) appends one immutable
//! [`UsageEvent`]. Events survive process restart and are only ever
//! bulk-trimmed oldest-first or bulk-cleared administratively. Aggregate
//! queries are computed from persisted state, never an in-memory mirror, so
//! they stay correct across restarts and multiple writers.

mod sqlite;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
pub use sqlite::SqliteUsageStore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One recorded call outcome. Appended exactly once per completed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// ISO-8601 UTC timestamp.
    pub ts: String,
    pub series_id: String,
    pub model_used: String,
    pub cache_hit: bool,
    pub runtime_ms: i64,
}

/// Aggregate statistics over the retained event window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_calls: u64,
    pub cache_hits: u64,
    pub cache_hit_rate: f64,
    pub avg_runtime_ms: f64,
    pub p50_runtime_ms: f64,
    pub p95_runtime_ms: f64,
    pub p99_runtime_ms: f64,
    pub by_model: BTreeMap<String, u64>,
}

/// Contract for the durable usage store.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Append one event, then trim retention to the configured bound.
    async fn append(&self, event: UsageEvent) -> StoreResult<()>;

    /// The most recent `limit` events, ordered oldest-to-newest.
    async fn recent(&self, limit: u32) -> StoreResult<Vec<UsageEvent>>;

    /// Number of retained events.
    async fn count(&self) -> StoreResult<u64>;

    /// Delete every event. Returns the number removed.
    async fn clear(&self) -> StoreResult<u64>;

    /// Aggregate statistics over all retained events.
    async fn summary(&self) -> StoreResult<UsageSummary>;
}

/// Nearest-rank percentile over an ascending-sorted sample.
///
/// `index = round(pct/100 * (n-1))`, clamped to valid bounds; a
/// single-element sample returns that element for every percentile.
pub(crate) fn percentile(sorted: &[i64], pct: f64) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only as f64,
        _ => {
            let index = ((pct / 100.0) * (sorted.len() - 1) as f64).round() as usize;
            sorted[index.min(sorted.len() - 1)] as f64
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_law() {
        let samples = [10, 20, 30];
        assert_eq!(percentile(&samples, 50.0), 20.0);
        assert_eq!(percentile(&samples, 95.0), 30.0);
        assert_eq!(percentile(&samples, 99.0), 30.0);
        assert_eq!(percentile(&samples, 0.0), 10.0);
    }

    #[test]
    fn test_percentile_single_sample() {
        let samples = [42];
        for pct in [0.0, 50.0, 95.0, 99.0, 100.0] {
            assert_eq!(percentile(&samples, pct), 42.0);
        }
    }

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_percentile_large_sample() {
        let samples: Vec<i64> = (1..=100).collect();
        // round(0.95 * 99) = 94 -> value 95
        assert_eq!(percentile(&samples, 95.0), 95.0);
        assert_eq!(percentile(&samples, 99.0), 99.0);
        assert_eq!(percentile(&samples, 100.0), 100.0);
    }
}
