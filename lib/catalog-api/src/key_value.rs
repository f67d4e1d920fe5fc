//! Key-value storage model

use serde::{Deserialize, Serialize};

/// A (namespace, key, value) triple as handled by the storage engine
///
/// The triple is serde round-trippable: record-oriented backends whose
/// external key is lossy store the whole triple as the record value so the
/// original namespace and key can be recovered on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub namespace: String,
    pub key: String,
    pub value: String,
}

impl KeyValue {
    /// Create a new entry
    pub fn new(
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}
