//! SQLite-backed usage store.
//!
//! Retention trims by insertion id, not timestamp, to tolerate clock skew.
//! Append and trim run inside one transaction, and writers are serialized
//! by a mutex; concurrent readers never observe a half-applied append+trim
//! pair. The single global writer lock is a known scalability bound.

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tokio::sync::Mutex;

use super::{StoreResult, UsageEvent, UsageStore, UsageSummary, percentile, round2, round4};

pub struct SqliteUsageStore {
    pool: SqlitePool,
    max_items: u32,
    write_lock: Mutex<()>,
}

impl SqliteUsageStore {
    /// Open (creating if missing) the store at `db_path` and bootstrap the
    /// schema. A `sqlite:` URI is passed through verbatim; anything else is
    /// treated as a filesystem path.
    pub async fn open(db_path: &str, max_items: u32, wal_mode: bool) -> StoreResult<Self> {
        let options = if db_path.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(db_path)?
        } else {
            if let Some(parent) = std::path::Path::new(db_path).parent()
                && !parent.as_os_str().is_empty()
            {
                // Creating the data directory is not sqlite's job.
                let _ = std::fs::create_dir_all(parent);
            }
            SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true)
        };
        let options = options
            .journal_mode(if wal_mode {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Memory
            })
            .busy_timeout(Duration::from_millis(5000));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            max_items,
            write_lock: Mutex::new(()),
        };
        store.bootstrap_schema().await?;
        Ok(store)
    }

    async fn bootstrap_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS usage_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts TEXT NOT NULL,
                series_id TEXT NOT NULL,
                model_used TEXT NOT NULL,
                cache_hit INTEGER NOT NULL,
                runtime_ms INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_usage_events_ts ON usage_events(ts)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl UsageStore for SqliteUsageStore {
    async fn append(&self, event: UsageEvent) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO usage_events (ts, series_id, model_used, cache_hit, runtime_ms)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.ts)
        .bind(&event.series_id)
        .bind(&event.model_used)
        .bind(event.cache_hit)
        .bind(event.runtime_ms)
        .execute(&mut *tx)
        .await?;

        // Retention: keep only the most recently inserted rows.
        sqlx::query(
            r#"
            DELETE FROM usage_events
            WHERE id NOT IN (
                SELECT id FROM usage_events
                ORDER BY id DESC
                LIMIT ?
            )
            "#,
        )
        .bind(i64::from(self.max_items))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn recent(&self, limit: u32) -> StoreResult<Vec<UsageEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT ts, series_id, model_used, cache_hit, runtime_ms
            FROM usage_events
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut events: Vec<UsageEvent> = rows
            .iter()
            .map(|row| UsageEvent {
                ts: row.get("ts"),
                series_id: row.get("series_id"),
                model_used: row.get("model_used"),
                cache_hit: row.get("cache_hit"),
                runtime_ms: row.get("runtime_ms"),
            })
            .collect();
        events.reverse();
        Ok(events)
    }

    async fn count(&self) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM usage_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn clear(&self) -> StoreResult<u64> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM usage_events")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn summary(&self) -> StoreResult<UsageSummary> {
        let totals = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_calls,
                COALESCE(SUM(cache_hit), 0) AS cache_hits,
                COALESCE(AVG(runtime_ms), 0.0) AS avg_runtime_ms
            FROM usage_events
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let model_rows = sqlx::query(
            r#"
            SELECT model_used, COUNT(*) AS calls
            FROM usage_events
            GROUP BY model_used
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let runtime_rows = sqlx::query(
            r#"
            SELECT runtime_ms
            FROM usage_events
            ORDER BY runtime_ms ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let total_calls = totals.get::<i64, _>("total_calls") as u64;
        let cache_hits = totals.get::<i64, _>("cache_hits") as u64;
        let avg_runtime_ms: f64 = totals.get("avg_runtime_ms");
        let cache_hit_rate = if total_calls > 0 {
            cache_hits as f64 / total_calls as f64
        } else {
            0.0
        };

        let by_model = model_rows
            .iter()
            .map(|row| {
                (
                    row.get::<String, _>("model_used"),
                    row.get::<i64, _>("calls") as u64,
                )
            })
            .collect();

        let runtimes: Vec<i64> = runtime_rows
            .iter()
            .map(|row| row.get::<i64, _>("runtime_ms"))
            .collect();

        Ok(UsageSummary {
            total_calls,
            cache_hits,
            cache_hit_rate: round4(cache_hit_rate),
            avg_runtime_ms: round2(avg_runtime_ms),
            p50_runtime_ms: round2(percentile(&runtimes, 50.0)),
            p95_runtime_ms: round2(percentile(&runtimes, 95.0)),
            p99_runtime_ms: round2(percentile(&runtimes, 99.0)),
            by_model,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn event(series_id: &str, model: &str, cache_hit: bool, runtime_ms: i64) -> UsageEvent {
        UsageEvent {
            ts: "2026-01-01T00:00:00+00:00".to_string(),
            series_id: series_id.to_string(),
            model_used: model.to_string(),
            cache_hit,
            runtime_ms,
        }
    }

    async fn open_store(dir: &TempDir, max_items: u32) -> SqliteUsageStore {
        let path = dir.path().join("usage.sqlite3");
        SqliteUsageStore::open(path.to_str().unwrap(), max_items, true)
            .await
            .expect("store opens")
    }

    #[tokio::test]
    async fn test_append_and_recent_ordering() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, 100).await;

        for i in 0..5 {
            store
                .append(event(&format!("s-{i}"), "dummy_v0", false, i))
                .await
                .unwrap();
        }

        // Most recent three, oldest first among them.
        let events = store.recent(3).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].series_id, "s-2");
        assert_eq!(events[2].series_id, "s-4");
        assert_eq!(store.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_retention_trims_oldest() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, 3).await;

        for i in 0..6 {
            store
                .append(event(&format!("s-{i}"), "dummy_v0", false, i))
                .await
                .unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 3);
        let events = store.recent(10).await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.series_id.as_str()).collect();
        assert_eq!(ids, vec!["s-3", "s-4", "s-5"]);
    }

    #[tokio::test]
    async fn test_persists_between_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("usage.sqlite3");

        {
            let store = SqliteUsageStore::open(path.to_str().unwrap(), 100, true)
                .await
                .unwrap();
            store
                .append(event("persist-series", "dummy_v0", false, 12))
                .await
                .unwrap();
        }

        let store = SqliteUsageStore::open(path.to_str().unwrap(), 100, true)
            .await
            .unwrap();
        let events = store.recent(10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].series_id, "persist-series");
    }

    #[tokio::test]
    async fn test_clear_reports_rows_removed() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, 100).await;

        for i in 0..4 {
            store
                .append(event("s", "dummy_v0", false, i))
                .await
                .unwrap();
        }
        assert_eq!(store.clear().await.unwrap(), 4);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_summary_aggregates() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, 100).await;

        store
            .append(event("s", "dummy_v0", false, 10))
            .await
            .unwrap();
        store
            .append(event("s", "sarima_v0", false, 20))
            .await
            .unwrap();
        store
            .append(event("s", "dummy_v0", true, 30))
            .await
            .unwrap();

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.total_calls, 3);
        assert_eq!(summary.cache_hits, 1);
        assert_eq!(summary.cache_hit_rate, 0.3333);
        assert_eq!(summary.avg_runtime_ms, 20.0);
        assert_eq!(summary.p50_runtime_ms, 20.0);
        assert_eq!(summary.p95_runtime_ms, 30.0);
        assert_eq!(summary.p99_runtime_ms, 30.0);
        assert_eq!(summary.by_model.get("dummy_v0"), Some(&2));
        assert_eq!(summary.by_model.get("sarima_v0"), Some(&1));
    }

    #[tokio::test]
    async fn test_summary_single_event() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, 100).await;

        store
            .append(event("s", "dummy_v0", false, 42))
            .await
            .unwrap();

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.p50_runtime_ms, 42.0);
        assert_eq!(summary.p95_runtime_ms, 42.0);
        assert_eq!(summary.p99_runtime_ms, 42.0);
    }

    #[tokio::test]
    async fn test_summary_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, 100).await;

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.total_calls, 0);
        assert_eq!(summary.cache_hit_rate, 0.0);
        assert_eq!(summary.p50_runtime_ms, 0.0);
        assert!(summary.by_model.is_empty());
    }
}
