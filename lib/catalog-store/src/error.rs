use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    /// A mutation referenced a key the backend does not hold. Read paths
    /// report absence as `Ok(None)` instead.
    #[error("Key not found: {namespace}/{key}")]
    NotFound { namespace: String, key: String },

    /// The backend could not be reached or failed mid-operation. Distinct
    /// from `NotFound` so callers can tell a miss from an outage.
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Shorthand for the `NotFound` variant
    pub fn not_found(namespace: &str, key: &str) -> Self {
        Self::NotFound {
            namespace: namespace.to_string(),
            key: key.to_string(),
        }
    }
}
