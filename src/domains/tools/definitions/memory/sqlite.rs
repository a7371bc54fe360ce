//! SQLite-backed memory store.
//!
//! A single connection behind a mutex: every operation takes the lock for
//! its whole read-check-then-write sequence, which serializes per-key
//! mutations. Blocking work runs on the tokio blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::store::{MemoryItem, MemoryPage, MemoryStore, StoreError};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS memory_items (
    id INTEGER PRIMARY KEY,
    key TEXT NOT NULL UNIQUE,
    value TEXT,
    metadata TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Memory store persisted in a SQLite database file.
#[derive(Clone)]
pub struct SqliteMemoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMemoryStore {
    /// Open (or create) the database at the given path and ensure the
    /// schema exists. Called once at bootstrap, before serving begins.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute(SCHEMA, []).map_err(db_err)?;
        info!("Memory store opened at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute(SCHEMA, []).map_err(db_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::Database("store mutex poisoned".to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Database(format!("store task failed: {}", e)))?
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn get(&self, key: &str) -> Result<MemoryItem, StoreError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, key, value, metadata, created_at, updated_at
                 FROM memory_items WHERE key = ?1",
                params![key],
                row_to_item,
            )
            .optional()
            .map_err(db_err)?
            .ok_or(StoreError::NotFound(key))
        })
        .await
    }

    async fn set(
        &self,
        key: Option<String>,
        value: Value,
        metadata: Value,
    ) -> Result<MemoryItem, StoreError> {
        let key = key.unwrap_or_else(|| Uuid::new_v4().to_string());
        self.with_conn(move |conn| {
            let now = Utc::now().to_rfc3339();
            let value_text = value.to_string();
            let metadata_text = metadata.to_string();

            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM memory_items WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err)?;

            match existing {
                Some(id) => {
                    conn.execute(
                        "UPDATE memory_items SET value = ?1, metadata = ?2, updated_at = ?3
                         WHERE id = ?4",
                        params![value_text, metadata_text, now, id],
                    )
                    .map_err(db_err)?;
                }
                None => {
                    conn.execute(
                        "INSERT INTO memory_items (key, value, metadata, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?4)",
                        params![key, value_text, metadata_text, now],
                    )
                    .map_err(db_err)?;
                }
            }

            conn.query_row(
                "SELECT id, key, value, metadata, created_at, updated_at
                 FROM memory_items WHERE key = ?1",
                params![key],
                row_to_item,
            )
            .map_err(db_err)
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let affected = conn
                .execute("DELETE FROM memory_items WHERE key = ?1", params![key])
                .map_err(db_err)?;
            if affected == 0 {
                return Err(StoreError::NotFound(key));
            }
            Ok(())
        })
        .await
    }

    async fn list(
        &self,
        filter_key: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<MemoryPage, StoreError> {
        let pattern = filter_key.map(|f| format!("%{}%", f));
        self.with_conn(move |conn| {
            let (total, items) = match &pattern {
                Some(pattern) => {
                    let total: i64 = conn
                        .query_row(
                            "SELECT COUNT(*) FROM memory_items WHERE key LIKE ?1",
                            params![pattern],
                            |row| row.get(0),
                        )
                        .map_err(db_err)?;
                    let mut stmt = conn
                        .prepare(
                            "SELECT id, key, value, metadata, created_at, updated_at
                             FROM memory_items WHERE key LIKE ?1
                             ORDER BY id LIMIT ?2 OFFSET ?3",
                        )
                        .map_err(db_err)?;
                    let items = stmt
                        .query_map(params![pattern, limit as i64, offset as i64], row_to_item)
                        .map_err(db_err)?
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(db_err)?;
                    (total, items)
                }
                None => {
                    let total: i64 = conn
                        .query_row("SELECT COUNT(*) FROM memory_items", [], |row| row.get(0))
                        .map_err(db_err)?;
                    let mut stmt = conn
                        .prepare(
                            "SELECT id, key, value, metadata, created_at, updated_at
                             FROM memory_items ORDER BY id LIMIT ?1 OFFSET ?2",
                        )
                        .map_err(db_err)?;
                    let items = stmt
                        .query_map(params![limit as i64, offset as i64], row_to_item)
                        .map_err(db_err)?
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(db_err)?;
                    (total, items)
                }
            };
            Ok(MemoryPage {
                items,
                total: total.max(0) as u64,
            })
        })
        .await
    }

    async fn search(&self, query: &str) -> Result<Vec<MemoryItem>, StoreError> {
        let pattern = format!("%{}%", query);
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, key, value, metadata, created_at, updated_at
                     FROM memory_items WHERE value LIKE ?1 ORDER BY id",
                )
                .map_err(db_err)?;
            stmt.query_map(params![pattern], row_to_item)
                .map_err(db_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_err)
        })
        .await
    }
}

fn db_err(err: rusqlite::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemoryItem> {
    let value_text: Option<String> = row.get(2)?;
    let metadata_text: Option<String> = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(MemoryItem {
        id: row.get(0)?,
        key: row.get(1)?,
        value: parse_json_column(value_text),
        metadata: parse_json_column(metadata_text),
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn parse_json_column(text: Option<String>) -> Value {
    text.and_then(|t| serde_json::from_str(&t).ok())
        .unwrap_or(Value::Null)
}

fn parse_timestamp(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_store() -> SqliteMemoryStore {
        SqliteMemoryStore::open_in_memory().unwrap()
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let store = test_store().await;
        let created = store
            .set(Some("k".to_string()), json!("v"), json!({}))
            .await
            .unwrap();
        assert_eq!(created.key, "k");

        let fetched = store.get("k").await.unwrap();
        assert_eq!(fetched.value, json!("v"));
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_set_updates_in_place() {
        let store = test_store().await;
        let first = store
            .set(Some("k".to_string()), json!("v"), json!({}))
            .await
            .unwrap();
        let second = store
            .set(Some("k".to_string()), json!("v2"), json!({"tag": "x"}))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let fetched = store.get("k").await.unwrap();
        assert_eq!(fetched.value, json!("v2"));
        assert_eq!(fetched.metadata, json!({"tag": "x"}));
    }

    #[tokio::test]
    async fn test_set_generates_key_when_absent() {
        let store = test_store().await;
        let item = store.set(None, json!(42), json!({})).await.unwrap();
        assert!(!item.key.is_empty());
        assert_eq!(store.get(&item.key).await.unwrap().value, json!(42));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = test_store().await;
        assert!(matches!(
            store.get("missing").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let store = test_store().await;
        store
            .set(Some("k".to_string()), json!("v"), json!({}))
            .await
            .unwrap();
        store.delete("k").await.unwrap();
        assert!(matches!(store.get("k").await, Err(StoreError::NotFound(_))));
        // second delete also fails
        assert!(matches!(
            store.delete("k").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let store = test_store().await;
        for i in 0..5 {
            store
                .set(Some(format!("task:{}", i)), json!(i), json!({}))
                .await
                .unwrap();
        }
        store
            .set(Some("note:0".to_string()), json!("n"), json!({}))
            .await
            .unwrap();

        let page = store.list(Some("task"), 2, 1).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].key, "task:1");

        let all = store.list(None, 100, 0).await.unwrap();
        assert_eq!(all.total, 6);
    }

    #[tokio::test]
    async fn test_search_matches_value_text() {
        let store = test_store().await;
        store
            .set(Some("a".to_string()), json!("the quick brown fox"), json!({}))
            .await
            .unwrap();
        store
            .set(Some("b".to_string()), json!("lazy dog"), json!({}))
            .await
            .unwrap();

        let hits = store.search("quick").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "a");
    }

    #[tokio::test]
    async fn test_concurrent_sets_on_same_key_are_serialized() {
        let store = test_store().await;
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set(Some("k".to_string()), json!(i), json!({})).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let item = store.get("k").await.unwrap();
        assert!(item.value.is_number());
        // exactly one row for the key survived the race
        let page = store.list(Some("k"), 100, 0).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_open_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.db");

        let store = SqliteMemoryStore::open(&path).unwrap();
        store
            .set(Some("k".to_string()), json!("v"), json!({}))
            .await
            .unwrap();
        drop(store);

        let reopened = SqliteMemoryStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").await.unwrap().value, json!("v"));
    }
}
