use serde::{Deserialize, Serialize};

/// One store record as returned by a read.
///
/// Entries are transient snapshots: they are produced by a read, handed to a
/// writer or an archive sink, and dropped. `value` is empty when the read was
/// keys-only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Raw key bytes, unique within the store.
    pub key: Vec<u8>,
    /// Raw value bytes.
    pub value: Vec<u8>,
    /// Number of modifications since the key was created.
    pub version: i64,
    /// Store revision at which the key was created.
    pub create_revision: i64,
    /// Store revision of the last modification.
    pub mod_revision: i64,
}

impl Entry {
    /// Build an entry without provenance metadata.
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// The key as text, with invalid UTF-8 replaced. For display only.
    pub fn key_lossy(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}

/// Modifiers for [`KvStore::get`](crate::KvStore::get).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Match the key and everything beneath it instead of the literal key.
    pub prefix: bool,
    /// Omit values.
    pub keys_only: bool,
    /// Sort results ascending by raw key bytes.
    pub sort_ascending: bool,
}

impl GetOptions {
    /// Exact-key lookup.
    pub fn exact() -> Self {
        Self::default()
    }

    /// Full subtree with values, ascending.
    pub fn subtree() -> Self {
        Self {
            prefix: true,
            keys_only: false,
            sort_ascending: true,
        }
    }

    /// Subtree listing without values, ascending.
    pub fn listing() -> Self {
        Self {
            prefix: true,
            keys_only: true,
            sort_ascending: true,
        }
    }
}
