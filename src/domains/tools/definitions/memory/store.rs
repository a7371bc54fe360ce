//! Memory store contract.
//!
//! The store is the one stateful collaborator in the gateway. It is
//! constructed before serving begins and injected into the memory tool as
//! a shared read-only handle; the engine behind it is swappable as long as
//! this contract holds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domains::tools::error::ToolError;

/// A single stored item.
///
/// `created_at` is assigned once on first `set`; `updated_at` is refreshed
/// on every mutation. Items never expire implicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: i64,
    pub key: String,
    pub value: Value,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of a `list` result.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    pub items: Vec<MemoryItem>,
    pub total: u64,
}

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No item exists under the given key.
    #[error("Memory item with key '{0}' not found")]
    NotFound(String),

    /// The underlying engine failed.
    #[error("Memory store error: {0}")]
    Database(String),
}

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ToolError::NotFound(err.to_string()),
            StoreError::Database(_) => ToolError::backend(err.to_string()),
        }
    }
}

/// Contract every memory store engine must satisfy.
///
/// Mutations for the same key must be serialized: `set` is a
/// read-check-then-write-or-update sequence and must be race-free under
/// concurrent calls for one key. Cross-key operations need no ordering.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Fetch an item by key; `NotFound` when absent.
    async fn get(&self, key: &str) -> Result<MemoryItem, StoreError>;

    /// Create or update an item. A random key is generated when `key` is
    /// `None`. Updates keep `created_at` and refresh `updated_at`.
    async fn set(
        &self,
        key: Option<String>,
        value: Value,
        metadata: Value,
    ) -> Result<MemoryItem, StoreError>;

    /// Remove an item by key; `NotFound` when absent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List items with an optional key-substring filter and pagination.
    async fn list(
        &self,
        filter_key: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<MemoryPage, StoreError>;

    /// Find items whose stored value contains the given text.
    async fn search(&self, query: &str) -> Result<Vec<MemoryItem>, StoreError>;
}
