//! Per-(client, tier) daily quota enforcement.
//!
//! A monotonic per-UTC-day counter, not a token bucket: bursts within a day
//! are unconstrained other than the absolute daily ceiling. The window is
//! the UTC calendar date supplied by the caller, so a stored record dated
//! before "today" is treated as reset to zero before evaluation.
//!
//! Concurrency: the DashMap entry API holds a shard write lock for the
//! duration of each read-modify-write, so decisions for a single key are
//! strictly serialized while unrelated keys only contend at shard
//! granularity.

use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Serialize;

#[derive(Debug, Clone)]
struct QuotaRecord {
    date: NaiveDate,
    used: u32,
    limit: u32,
}

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy)]
pub struct QuotaDecision {
    pub permitted: bool,
    /// Slots left today after this call. Never negative; zero when denied.
    pub remaining: u32,
}

/// Usage of a single key, as reported by [`QuotaLimiter::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct QuotaKeyUsage {
    pub key: String,
    pub used: u32,
    pub remaining: u32,
}

/// Snapshot of today's quota activity.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaStats {
    pub active_keys: usize,
    pub top: Vec<QuotaKeyUsage>,
}

/// Daily call counter keyed by `client_id:tier_name`.
#[derive(Default)]
pub struct QuotaLimiter {
    state: DashMap<String, QuotaRecord>,
}

impl QuotaLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and consume one quota slot for `key`.
    ///
    /// If the stored record is from an earlier date the counter resets
    /// before evaluation. At or above the limit the call is denied without
    /// incrementing and `remaining` is zero; otherwise the counter
    /// increments and `remaining` is the post-increment headroom.
    pub fn allow(&self, key: &str, daily_limit: u32, today: NaiveDate) -> QuotaDecision {
        let mut entry = self
            .state
            .entry(key.to_string())
            .or_insert_with(|| QuotaRecord {
                date: today,
                used: 0,
                limit: daily_limit,
            });
        let record = entry.value_mut();

        if record.date != today {
            record.date = today;
            record.used = 0;
        }
        // The limit can change between calls when tiers are reconfigured;
        // the latest one wins for reporting.
        record.limit = daily_limit;

        if record.used >= daily_limit {
            tracing::debug!(quota_key = %key, limit = daily_limit, "daily quota exhausted");
            return QuotaDecision {
                permitted: false,
                remaining: 0,
            };
        }

        record.used += 1;
        QuotaDecision {
            permitted: true,
            remaining: daily_limit - record.used,
        }
    }

    /// Today's active keys sorted by descending usage, truncated to
    /// `max(top_n, 1)`.
    pub fn stats(&self, top_n: usize, today: NaiveDate) -> QuotaStats {
        let mut top: Vec<QuotaKeyUsage> = self
            .state
            .iter()
            .filter(|entry| entry.value().date == today)
            .map(|entry| {
                let record = entry.value();
                QuotaKeyUsage {
                    key: entry.key().clone(),
                    used: record.used,
                    remaining: record.limit.saturating_sub(record.used),
                }
            })
            .collect();

        let active_keys = top.len();
        top.sort_by(|a, b| b.used.cmp(&a.used).then_with(|| a.key.cmp(&b.key)));
        top.truncate(top_n.max(1));

        QuotaStats { active_keys, top }
    }

    /// Reset all state. Returns the number of keys dropped.
    pub fn clear(&self) -> usize {
        let cleared = self.state.len();
        self.state.clear();
        cleared
    }
}
