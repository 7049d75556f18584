//! Key-value store access for kvtar.
//!
//! The transfer engine never talks to a store directly. It consumes the four
//! primitives of the [`KvStore`] trait:
//!
//! - `get` -- a single key or a prefixed subtree, optionally keys-only and
//!   sorted ascending by raw key bytes
//! - `put` -- single-key upsert
//! - `delete` -- a single key or a prefixed subtree, returning the count
//! - `count` -- number of keys under a prefix, no payloads
//!
//! # Backends
//!
//! - [`InMemoryKvStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`GatewayStore`] -- etcd v3 client speaking the JSON gateway API
//!
//! # Design Rules
//!
//! 1. Entries are snapshots: nothing returned by a read is ever mutated.
//! 2. No locking and no isolation. A subtree read racing an external writer
//!    may observe a mix of old and new values.
//! 3. All transport errors are propagated, never retried.

pub mod config;
pub mod entry;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod range;
pub mod traits;

pub use config::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, ENDPOINTS_ENV};
pub use entry::{Entry, GetOptions};
pub use error::{StoreError, StoreResult};
pub use gateway::GatewayStore;
pub use memory::InMemoryKvStore;
pub use range::prefix_range_end;
pub use traits::KvStore;
