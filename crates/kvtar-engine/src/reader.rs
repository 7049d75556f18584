use kvtar_store::{Entry, GetOptions, KvStore};

use crate::error::EngineResult;

/// Read side of the namespace: single keys, subtrees, listings and counts.
///
/// Whenever a read may return more than one entry, the results are ordered
/// ascending by raw key bytes.
#[derive(Clone, Copy)]
pub struct NamespaceReader<'s> {
    store: &'s dyn KvStore,
}

impl<'s> NamespaceReader<'s> {
    pub fn new(store: &'s dyn KvStore) -> Self {
        Self { store }
    }

    /// Read with explicit options. Prefix reads are always sorted.
    pub fn get(&self, key: &[u8], mut opts: GetOptions) -> EngineResult<Vec<Entry>> {
        if opts.prefix {
            opts.sort_ascending = true;
        }
        tracing::debug!("Doing GET({}, {:?})...", String::from_utf8_lossy(key), opts);
        Ok(self.store.get(key, opts)?)
    }

    /// The literal key, if present.
    pub fn exact(&self, key: &[u8]) -> EngineResult<Option<Entry>> {
        Ok(self.get(key, GetOptions::exact())?.into_iter().next())
    }

    /// Every entry under `prefix`, with values.
    pub fn subtree(&self, prefix: &[u8]) -> EngineResult<Vec<Entry>> {
        self.get(prefix, GetOptions::subtree())
    }

    /// Every key under `prefix`, without values.
    pub fn listing(&self, prefix: &[u8]) -> EngineResult<Vec<Entry>> {
        self.get(prefix, GetOptions::listing())
    }

    /// Number of keys under `prefix`.
    pub fn count(&self, prefix: &[u8]) -> EngineResult<u64> {
        tracing::debug!("Doing COUNT({})...", String::from_utf8_lossy(prefix));
        Ok(self.store.count(prefix)?)
    }
}
