//! Backend-agnostic key-value storage for the catalog cache
//!
//! This library provides:
//! - The `Storage` contract shared by all backends
//! - An in-memory backend for single-process deployments
//! - A fixed-record backend encoding composite keys for record stores
//!   that only accept fixed-length keys
//! - A remote backend delegating the contract over HTTP

pub mod composite_key;
pub mod error;
pub mod fixed_record;
pub mod memory;
pub mod remote;
pub mod storage;

pub use composite_key::CompositeKeyCodec;
pub use error::{Result, StorageError};
pub use fixed_record::{DatasetError, FixedRecordStorage, RecordDataset};
pub use memory::MemoryStorage;
pub use remote::RemoteStorage;
pub use storage::Storage;
