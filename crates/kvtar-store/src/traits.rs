use crate::entry::{Entry, GetOptions};
use crate::error::StoreResult;

/// The four store primitives the transfer engine is built on.
///
/// Implementations must satisfy these invariants:
/// - With `prefix` set, `key` matches itself and every key that starts with
///   it. An empty key selects the whole namespace.
/// - With `sort_ascending` set, results are ordered by raw key bytes.
/// - Writes are last-write-wins. No conditional updates.
/// - All transport errors are propagated, never silently ignored.
///
/// Methods take `&self`; a single handle is shared for the whole invocation.
pub trait KvStore {
    /// Read a key or a prefixed subtree.
    fn get(&self, key: &[u8], opts: GetOptions) -> StoreResult<Vec<Entry>>;

    /// Insert or overwrite a single key.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Delete a single key, or every key under `key` when `prefix` is set.
    ///
    /// Returns the number of keys removed.
    fn delete(&self, key: &[u8], prefix: bool) -> StoreResult<u64>;

    /// Count the keys under a prefix without transferring them.
    fn count(&self, prefix: &[u8]) -> StoreResult<u64>;
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &[u8], opts: GetOptions) -> StoreResult<Vec<Entry>> {
        (**self).get(key, opts)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8], prefix: bool) -> StoreResult<u64> {
        (**self).delete(key, prefix)
    }

    fn count(&self, prefix: &[u8]) -> StoreResult<u64> {
        (**self).count(prefix)
    }
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn get(&self, key: &[u8], opts: GetOptions) -> StoreResult<Vec<Entry>> {
        (**self).get(key, opts)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8], prefix: bool) -> StoreResult<u64> {
        (**self).delete(key, prefix)
    }

    fn count(&self, prefix: &[u8]) -> StoreResult<u64> {
        (**self).count(prefix)
    }
}
