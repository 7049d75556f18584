use kvtar_codec::KeyPathCodec;
use kvtar_store::KvStore;

use crate::error::EngineResult;

/// Write side of the namespace: single-key upserts and deletions.
#[derive(Clone, Copy)]
pub struct NamespaceWriter<'s> {
    store: &'s dyn KvStore,
    keys: KeyPathCodec,
}

impl<'s> NamespaceWriter<'s> {
    pub fn new(store: &'s dyn KvStore, keys: KeyPathCodec) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &KeyPathCodec {
        &self.keys
    }

    /// Insert or overwrite `key`. Last write wins.
    pub fn put(&self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        tracing::debug!("Doing PUT({}, [{}])...", String::from_utf8_lossy(key), value.len());
        self.store.put(key, value)?;
        Ok(())
    }

    /// Effective deletion mode: a trailing-separator key is a directory
    /// marker and always takes its subtree with it.
    pub fn is_recursive(&self, key: &[u8], recursive: bool) -> bool {
        recursive || self.keys.is_directory_key(key)
    }

    /// Delete `key`, or its whole subtree when the deletion is recursive.
    /// Returns the number of keys removed.
    pub fn delete(&self, key: &[u8], recursive: bool) -> EngineResult<u64> {
        let prefix = self.is_recursive(key, recursive);
        tracing::debug!("Doing DEL({}, prefix={})...", String::from_utf8_lossy(key), prefix);
        Ok(self.store.delete(key, prefix)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvtar_store::InMemoryKvStore;

    fn store() -> InMemoryKvStore {
        InMemoryKvStore::with_entries([
            ("cfg/a", "1"),
            ("cfg/b", "2"),
            ("cfg/sub/", ""),
            ("cfg/sub/x", "x"),
        ])
    }

    #[test]
    fn put_overwrites() {
        let store = store();
        let writer = NamespaceWriter::new(&store, KeyPathCodec::default());
        writer.put(b"cfg/a", b"new").unwrap();
        assert_eq!(store.value(b"cfg/a").unwrap(), b"new");
    }

    #[test]
    fn non_recursive_delete_hits_one_key() {
        let store = store();
        let writer = NamespaceWriter::new(&store, KeyPathCodec::default());
        assert_eq!(writer.delete(b"cfg/a", false).unwrap(), 1);
        assert_eq!(writer.delete(b"cfg", false).unwrap(), 0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn recursive_delete_takes_subtree() {
        let store = store();
        let writer = NamespaceWriter::new(&store, KeyPathCodec::default());
        assert_eq!(writer.delete(b"cfg/", true).unwrap(), 4);
        assert!(store.is_empty());
    }

    #[test]
    fn trailing_separator_implies_recursive() {
        let store = store();
        let writer = NamespaceWriter::new(&store, KeyPathCodec::default());
        assert!(writer.is_recursive(b"cfg/sub/", false));
        assert!(!writer.is_recursive(b"cfg/sub", false));
        assert_eq!(writer.delete(b"cfg/sub/", false).unwrap(), 2);
        assert_eq!(store.keys(), vec![b"cfg/a".to_vec(), b"cfg/b".to_vec()]);
    }
}
