//! In-memory storage backend

use crate::storage::Storage;
use crate::{Result, StorageError};
use catalog_api::KeyValue;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local backend with no persistence
///
/// Entries live in a map keyed by (namespace, key); all operations are O(1)
/// apart from listing.
pub struct MemoryStorage {
    entries: RwLock<HashMap<(String, String), String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries across all namespaces
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn put(&self, entry: KeyValue) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert((entry.namespace, entry.key), entry.value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        match entries.remove(&(namespace.to_string(), key.to_string())) {
            Some(_) => Ok(()),
            None => {
                debug!("Delete miss for {}/{}", namespace, key);
                Err(StorageError::not_found(namespace, key))
            }
        }
    }

    async fn list_all(&self, namespace: &str) -> Result<Vec<KeyValue>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|((ns, key), value)| KeyValue::new(ns.clone(), key.clone(), value.clone()))
            .collect())
    }
}
