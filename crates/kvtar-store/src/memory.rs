use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use crate::entry::{Entry, GetOptions};
use crate::error::StoreResult;
use crate::traits::KvStore;

#[derive(Clone, Debug)]
struct Record {
    value: Vec<u8>,
    version: i64,
    create_revision: i64,
    mod_revision: i64,
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<Vec<u8>, Record>,
    revision: i64,
}

/// In-memory, `BTreeMap`-based key-value store.
///
/// Intended for tests and embedding. Keys are kept in raw byte order, so
/// prefix scans come back ascending for free. Revisions follow the etcd
/// model: one store-wide counter bumped by every mutating call.
pub struct InMemoryKvStore {
    inner: RwLock<Inner>,
}

impl InMemoryKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Create a store pre-populated with `(key, value)` pairs, inserted in order.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let store = Self::new();
        for (k, v) in entries {
            store.insert(k.as_ref(), v.as_ref());
        }
        store
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").records.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current store revision.
    pub fn revision(&self) -> i64 {
        self.inner.read().expect("lock poisoned").revision
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        let inner = self.inner.read().expect("lock poisoned");
        inner.records.keys().cloned().collect()
    }

    /// Value stored at `key`, if any.
    pub fn value(&self, key: &[u8]) -> Option<Vec<u8>> {
        let inner = self.inner.read().expect("lock poisoned");
        inner.records.get(key).map(|r| r.value.clone())
    }

    fn insert(&self, key: &[u8], value: &[u8]) {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.revision += 1;
        let rev = inner.revision;
        match inner.records.get_mut(key) {
            Some(record) => {
                record.value = value.to_vec();
                record.version += 1;
                record.mod_revision = rev;
            }
            None => {
                inner.records.insert(
                    key.to_vec(),
                    Record {
                        value: value.to_vec(),
                        version: 1,
                        create_revision: rev,
                        mod_revision: rev,
                    },
                );
            }
        }
    }

    fn matching_keys(records: &BTreeMap<Vec<u8>, Record>, key: &[u8], prefix: bool) -> Vec<Vec<u8>> {
        if !prefix {
            return records.get_key_value(key).map(|(k, _)| k.clone()).into_iter().collect();
        }
        records
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(key))
            .map(|(k, _)| k.clone())
            .collect()
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &[u8], opts: GetOptions) -> StoreResult<Vec<Entry>> {
        let inner = self.inner.read().expect("lock poisoned");
        let keys = Self::matching_keys(&inner.records, key, opts.prefix);
        let mut out: Vec<Entry> = keys
            .into_iter()
            .filter_map(|k| {
                inner.records.get(&k).map(|r| Entry {
                    value: if opts.keys_only { Vec::new() } else { r.value.clone() },
                    version: r.version,
                    create_revision: r.create_revision,
                    mod_revision: r.mod_revision,
                    key: k,
                })
            })
            .collect();
        if opts.sort_ascending {
            out.sort_by(|a, b| a.key.cmp(&b.key));
        }
        Ok(out)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &[u8], prefix: bool) -> StoreResult<u64> {
        let mut inner = self.inner.write().expect("lock poisoned");
        let keys = Self::matching_keys(&inner.records, key, prefix);
        if keys.is_empty() {
            return Ok(0);
        }
        inner.revision += 1;
        for k in &keys {
            inner.records.remove(k);
        }
        Ok(keys.len() as u64)
    }

    fn count(&self, prefix: &[u8]) -> StoreResult<u64> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(Self::matching_keys(&inner.records, prefix, true).len() as u64)
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvStore")
            .field("key_count", &self.len())
            .field("revision", &self.revision())
            .finish()
    }
}
