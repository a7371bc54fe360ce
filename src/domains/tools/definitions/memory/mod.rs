//! Memory tool - persistent key-value store with metadata and timestamps.

mod sqlite;
mod store;

pub use sqlite::SqliteMemoryStore;
pub use store::{MemoryItem, MemoryPage, MemoryStore, StoreError};

use std::sync::Arc;

use serde_json::{Value, json};

use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::Parameters;
use crate::domains::tools::spec::{ActionSpec, ParamType, Tool};

/// The `memory` tool. Holds a shared handle to the store opened at
/// bootstrap; the engine behind the handle is interchangeable.
pub struct MemoryTool {
    store: Arc<dyn MemoryStore>,
}

impl MemoryTool {
    pub const NAME: &'static str = "memory";

    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

async fn get_item(store: Arc<dyn MemoryStore>, params: Parameters) -> Result<Value, ToolError> {
    let key = params.require_str("key")?;
    let item = store.get(key).await?;
    serde_json::to_value(item).map_err(|e| ToolError::internal(e.to_string()))
}

async fn set_item(store: Arc<dyn MemoryStore>, params: Parameters) -> Result<Value, ToolError> {
    // An empty key counts as absent and triggers key generation.
    let key = params
        .str_opt("key")
        .filter(|k| !k.is_empty())
        .map(str::to_string);
    let value = params.get("value").cloned().unwrap_or(Value::Null);
    let metadata = params.get("metadata").cloned().unwrap_or_else(|| json!({}));

    let item = store.set(key, value, metadata).await?;
    serde_json::to_value(item).map_err(|e| ToolError::internal(e.to_string()))
}

async fn delete_item(store: Arc<dyn MemoryStore>, params: Parameters) -> Result<Value, ToolError> {
    let key = params.require_str("key")?;
    store.delete(key).await?;
    Ok(json!({
        "success": true,
        "message": format!("Memory item with key {} deleted successfully", key),
    }))
}

async fn list_items(store: Arc<dyn MemoryStore>, params: Parameters) -> Result<Value, ToolError> {
    let filter_key = params.str_opt("filterKey").filter(|f| !f.is_empty());
    let limit = params.u64_or("limit", 100);
    let offset = params.u64_or("offset", 0);

    let page = store.list(filter_key, limit, offset).await?;
    Ok(json!({
        "items": page.items,
        "total": page.total,
        "limit": limit,
        "offset": offset,
    }))
}

async fn search_items(store: Arc<dyn MemoryStore>, params: Parameters) -> Result<Value, ToolError> {
    let query = params.require_str("q")?;
    let items = store.search(query).await?;
    Ok(json!({
        "count": items.len(),
        "items": items,
        "query": query,
    }))
}

impl Tool for MemoryTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![
            ActionSpec::builder("get", "Get a memory item by key")
                .required("key", ParamType::String, "Memory item key")
                .returns("object", "Memory item")
                .handler({
                    let store = self.store.clone();
                    move |params| {
                        let store = store.clone();
                        async move { get_item(store, params).await }
                    }
                }),
            ActionSpec::builder("set", "Create or update a memory item")
                .optional(
                    "key",
                    ParamType::String,
                    "Memory item key (generated when absent)",
                )
                .optional("value", ParamType::Any, "Memory item value")
                .with_default("metadata", ParamType::Object, "Optional metadata", json!({}))
                .returns("object", "Created or updated memory item")
                .handler({
                    let store = self.store.clone();
                    move |params| {
                        let store = store.clone();
                        async move { set_item(store, params).await }
                    }
                }),
            ActionSpec::builder("delete", "Delete a memory item by key")
                .required("key", ParamType::String, "Memory item key")
                .returns("object", "Deletion result")
                .handler({
                    let store = self.store.clone();
                    move |params| {
                        let store = store.clone();
                        async move { delete_item(store, params).await }
                    }
                }),
            ActionSpec::builder("list", "List all memory items, with optional filtering")
                .optional("filterKey", ParamType::String, "Optional key filter")
                .with_default(
                    "limit",
                    ParamType::Number,
                    "Maximum number of items to return",
                    json!(100),
                )
                .with_default("offset", ParamType::Number, "Number of items to skip", json!(0))
                .returns("object", "List of memory items with pagination info")
                .handler({
                    let store = self.store.clone();
                    move |params| {
                        let store = store.clone();
                        async move { list_items(store, params).await }
                    }
                }),
            ActionSpec::builder("search", "Search memory items by value")
                .required("q", ParamType::String, "Search query")
                .returns("object", "Matching memory items")
                .handler({
                    let store = self.store.clone();
                    move |params| {
                        let store = store.clone();
                        async move { search_items(store, params).await }
                    }
                }),
        ]
    }
}
