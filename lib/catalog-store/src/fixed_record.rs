//! Fixed-record storage backend for fixed-length-key record stores

use crate::composite_key::CompositeKeyCodec;
use crate::storage::Storage;
use crate::{Result, StorageError};
use catalog_api::KeyValue;
use thiserror::Error;
use tracing::debug;

/// Failure inside the physical record store
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Record dataset unavailable: {0}")]
    Unavailable(String),
}

impl From<DatasetError> for StorageError {
    fn from(err: DatasetError) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}

/// The physical record store behind the fixed-record backend
///
/// Records are addressed by an opaque fixed-length key; the I/O layer itself
/// (legacy keyed datasets, typically) lives outside this crate.
#[async_trait::async_trait]
pub trait RecordDataset: Send + Sync {
    /// Read the record stored under a key, if any
    async fn read(&self, key: &str) -> std::result::Result<Option<String>, DatasetError>;

    /// Write a record, replacing any previous one under the key
    async fn write(&self, key: &str, value: &str) -> std::result::Result<(), DatasetError>;

    /// Erase the record under a key; `false` when no record existed
    async fn erase(&self, key: &str) -> std::result::Result<bool, DatasetError>;

    /// All (key, record) pairs currently held
    async fn records(&self) -> std::result::Result<Vec<(String, String)>, DatasetError>;
}

/// Storage backend addressing a `RecordDataset` through composite keys
///
/// The external key is the codec's fixed-width encoding of (namespace, key).
/// Because that encoding is lossy, the record value is the full `KeyValue`
/// triple serialized as JSON; reads decode it and check that the stored
/// namespace and key match the request, so a truncation collision surfaces
/// as a miss rather than as another entry's value.
pub struct FixedRecordStorage<D> {
    codec: CompositeKeyCodec,
    dataset: D,
}

impl<D: RecordDataset> FixedRecordStorage<D> {
    /// Create a backend with the default 4/4 field widths
    pub fn new(dataset: D) -> Self {
        Self::with_codec(dataset, CompositeKeyCodec::default())
    }

    /// Create a backend with explicit field widths
    pub fn with_codec(dataset: D, codec: CompositeKeyCodec) -> Self {
        Self { codec, dataset }
    }

    async fn read_owned(&self, namespace: &str, key: &str) -> Result<Option<KeyValue>> {
        let external = self.codec.encode(namespace, key);
        let Some(raw) = self.dataset.read(&external).await? else {
            return Ok(None);
        };

        let entry: KeyValue = serde_json::from_str(&raw)?;
        if entry.namespace == namespace && entry.key == key {
            Ok(Some(entry))
        } else {
            debug!(
                "Record {} holds {}/{}, not {}/{}; treating as miss",
                external, entry.namespace, entry.key, namespace, key
            );
            Ok(None)
        }
    }
}

#[async_trait::async_trait]
impl<D: RecordDataset> Storage for FixedRecordStorage<D> {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .read_owned(namespace, key)
            .await?
            .map(|entry| entry.value))
    }

    async fn put(&self, entry: KeyValue) -> Result<()> {
        let external = self.codec.encode(&entry.namespace, &entry.key);
        let raw = serde_json::to_string(&entry)?;
        self.dataset.write(&external, &raw).await?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        // Check ownership first so a collision cannot erase another entry.
        if self.read_owned(namespace, key).await?.is_none() {
            return Err(StorageError::not_found(namespace, key));
        }

        let external = self.codec.encode(namespace, key);
        self.dataset.erase(&external).await?;
        Ok(())
    }

    async fn list_all(&self, namespace: &str) -> Result<Vec<KeyValue>> {
        let prefix = self.codec.namespace_field(namespace);
        let mut entries = Vec::new();

        for (external, raw) in self.dataset.records().await? {
            if !external.starts_with(&prefix) {
                continue;
            }
            let entry: KeyValue = serde_json::from_str(&raw)?;
            // A truncated namespace field can match foreign namespaces.
            if entry.namespace == namespace {
                entries.push(entry);
            }
        }

        Ok(entries)
    }
}
