//! Storage contract shared by all backends

use crate::Result;
use catalog_api::KeyValue;

/// Backend-agnostic key-value storage
///
/// Backend choice is a deployment concern; callers hold a `dyn Storage` and
/// never branch on which backend is behind it.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Read one value; an absent key is `Ok(None)`, never an error
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    /// Write one entry, replacing any previous value for its key
    async fn put(&self, entry: KeyValue) -> Result<()>;

    /// Remove one entry; `StorageError::NotFound` when the key is absent
    async fn delete(&self, namespace: &str, key: &str) -> Result<()>;

    /// All entries under a namespace, in no particular order
    async fn list_all(&self, namespace: &str) -> Result<Vec<KeyValue>>;
}
