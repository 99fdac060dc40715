//! Persistence behind a small key-value interface.
//!
//! Progress records are stored as JSON documents under namespaced keys, so
//! the tracking logic can run on any backend that implements
//! [`KeyValueStore`].

mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::AppError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type SharedStore = Arc<dyn KeyValueStore>;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Inserts or replaces the value.
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Inserts only if the key is absent. Returns whether the value was written.
    /// Must be atomic: of two concurrent callers at most one gets `true`.
    async fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool, AppError>;

    /// Returns whether a value was removed.
    async fn remove(&self, key: &str) -> Result<bool, AppError>;

    /// All entries whose key starts with `prefix`, ordered by key.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, AppError>;
}

/// Reads and decodes a JSON document.
pub async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, AppError> {
    match store.get(key).await? {
        Some(raw) => decode(key, &raw).map(Some),
        None => Ok(None),
    }
}

/// Encodes and writes a JSON document.
pub async fn save<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    store.set(key, &encode(value)?).await
}

/// Encodes and writes a JSON document only if the key is free.
pub async fn create<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<bool, AppError> {
    store.insert_if_absent(key, &encode(value)?).await
}

/// Decodes every document under `prefix`.
pub async fn load_prefix<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    prefix: &str,
) -> Result<Vec<T>, AppError> {
    store
        .scan_prefix(prefix)
        .await?
        .iter()
        .map(|(key, raw)| decode(key, raw))
        .collect()
}

fn encode<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| AppError::InternalServerError(e.to_string()))
}

// Stored data is ours, so a decode failure is a server fault, not a bad request.
fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        tracing::error!("Corrupt document under key {}: {:?}", key, e);
        AppError::InternalServerError(e.to_string())
    })
}
