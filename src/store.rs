use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::log_store_operation;

/// Durable string key-value storage backing the persistence layer
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// SQLite-backed store, one row per key
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // A single connection keeps `sqlite::memory:` databases alive and writes serialized
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = SqliteStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        log_store_operation!(info, "migrate", "key-value table ready");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let started = Instant::now();
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let value = match row {
            Some(row) => Some(row.try_get::<String, _>("value")?),
            None => None,
        };

        log_store_operation!(debug, "get", key = key, duration_ms = started.elapsed().as_millis() as u64);
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let started = Instant::now();
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        log_store_operation!(debug, "put", key = key, duration_ms = started.elapsed().as_millis() as u64);
        Ok(())
    }
}

/// In-process store for tests and embedding, contents die with the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing the typed persistence layer
    pub async fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_store_round_trip() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();

        assert_eq!(store.get("ccse_stats_v1").await.unwrap(), None);

        store.put("ccse_stats_v1", "{\"attempts\":1}").await.unwrap();
        store.put("ccse_stats_v1", "{\"attempts\":2}").await.unwrap();
        assert_eq!(
            store.get("ccse_stats_v1").await.unwrap().as_deref(),
            Some("{\"attempts\":2}")
        );

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_store")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("study.db").display());

        {
            let store = SqliteStore::new(&url).await.unwrap();
            store.put("ccse_bookmarks_v1", "[\"1001\"]").await.unwrap();
            store.pool.close().await;
        }

        let reopened = SqliteStore::new(&url).await.unwrap();
        assert_eq!(
            reopened.get("ccse_bookmarks_v1").await.unwrap().as_deref(),
            Some("[\"1001\"]")
        );
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        store.insert_raw("k", "v1").await;
        store.put("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }
}
