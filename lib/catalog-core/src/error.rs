use catalog_api::InvalidVersionFormat;
use catalog_store::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// A mutation referenced a family id the cache does not hold. Read
    /// paths return `None` or an empty list instead.
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error(transparent)]
    InvalidVersionFormat(#[from] InvalidVersionFormat),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
