//! Remote storage backend delegating over HTTP

use crate::storage::Storage;
use crate::{Result, StorageError};
use catalog_api::KeyValue;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Network delegate implementing the storage contract against a remote
/// store speaking `GET/POST/DELETE {base}/api/v1/store/{namespace}[/{key}]`
///
/// An HTTP 404 is a miss; transport failures and unexpected statuses map to
/// `StorageError::Unavailable` so callers can tell the two apart.
pub struct RemoteStorage {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteStorage {
    /// Create a delegate for the given base URL with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn namespace_url(&self, namespace: &str) -> String {
        format!("{}/api/v1/store/{}", self.base_url, namespace)
    }

    fn entry_url(&self, namespace: &str, key: &str) -> String {
        format!("{}/{}", self.namespace_url(namespace), key)
    }
}

fn transport_err(err: reqwest::Error) -> StorageError {
    StorageError::Unavailable(err.to_string())
}

fn status_err(url: &str, status: StatusCode) -> StorageError {
    StorageError::Unavailable(format!("{} answered {}", url, status))
}

#[async_trait::async_trait]
impl Storage for RemoteStorage {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let url = self.entry_url(namespace, key);
        let response = self.client.get(&url).send().await.map_err(transport_err)?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("Remote store miss for {}/{}", namespace, key);
                Ok(None)
            }
            status if status.is_success() => {
                let entry: KeyValue = response.json().await.map_err(transport_err)?;
                Ok(Some(entry.value))
            }
            status => Err(status_err(&url, status)),
        }
    }

    async fn put(&self, entry: KeyValue) -> Result<()> {
        let url = self.namespace_url(&entry.namespace);
        let response = self
            .client
            .post(&url)
            .json(&entry)
            .send()
            .await
            .map_err(transport_err)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_err(&url, response.status()))
        }
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        let url = self.entry_url(namespace, key);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(transport_err)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::not_found(namespace, key)),
            status if status.is_success() => Ok(()),
            status => Err(status_err(&url, status)),
        }
    }

    async fn list_all(&self, namespace: &str) -> Result<Vec<KeyValue>> {
        let url = self.namespace_url(namespace);
        let response = self.client.get(&url).send().await.map_err(transport_err)?;

        if response.status().is_success() {
            response.json().await.map_err(transport_err)
        } else {
            Err(status_err(&url, response.status()))
        }
    }
}
