use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::log_store_operation;
use crate::models::{BookmarkSet, StatisticsRecord, StudyMode};
use crate::store::KeyValueStore;

pub const STATS_KEY: &str = "ccse_stats_v1";
pub const BOOKMARKS_KEY: &str = "ccse_bookmarks_v1";
pub const MODE_KEY: &str = "ccse_mode_v1";

/// Typed load/save of the persisted records.
///
/// Read failures and corrupt records fall back to defaults, write failures
/// are logged and dropped. Nothing here is ever surfaced to the caller.
#[derive(Clone)]
pub struct PersistenceStore {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load_statistics(&self) -> StatisticsRecord {
        self.read_json(STATS_KEY).await.unwrap_or_default()
    }

    /// Refreshes `last_updated` before writing
    pub async fn save_statistics(&self, stats: &mut StatisticsRecord) {
        stats.last_updated = Utc::now();
        self.write_json(STATS_KEY, stats).await;
    }

    pub async fn load_bookmarks(&self) -> BookmarkSet {
        self.read_json::<Vec<String>>(BOOKMARKS_KEY)
            .await
            .map(BookmarkSet::from_ids)
            .unwrap_or_default()
    }

    pub async fn save_bookmarks(&self, bookmarks: &BookmarkSet) {
        self.write_json(BOOKMARKS_KEY, &bookmarks.to_vec()).await;
    }

    pub async fn load_mode(&self) -> Option<StudyMode> {
        self.read_json(MODE_KEY).await
    }

    pub async fn save_mode(&self, mode: &StudyMode) {
        self.write_json(MODE_KEY, mode).await;
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log_store_operation!(warn, "load", key = key, error = e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log_store_operation!(warn, "load", key = key, error = e);
                None
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log_store_operation!(error, "serialize", key = key, error = e);
                return;
            }
        };

        if let Err(e) = self.store.put(key, &raw).await {
            log_store_operation!(error, "put", key = key, error = e);
        }
    }
}
