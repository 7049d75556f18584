//! Transfer engine for kvtar.
//!
//! Composes the store, the codecs and the archive sinks into the bulk
//! operations behind each command: list, get, put, remove, dump, upload and
//! tar/zip archiving. Recursive removals go through a count-and-confirm gate
//! whose answers come from an injectable [`Confirm`] implementation.

pub mod confirm;
pub mod error;
pub mod reader;
pub mod transfer;
pub mod writer;

pub use confirm::{answer_is_yes, AlwaysNo, AlwaysYes, Confirm, ConfirmState, RemovalConfirmer};
pub use error::{EngineError, EngineResult};
pub use reader::NamespaceReader;
pub use transfer::{
    archive, default_selectors, dump, export, get, list, put, remove, upload, FetchedValue, Listing, RemovalReport,
    TransferReport,
};
pub use writer::NamespaceWriter;

// Re-export the types callers need to drive an operation
pub use kvtar_archive::{ArchiveSink, DirectorySink, DirectorySource, TarSink, ZipSink};
pub use kvtar_codec::{KeyPathCodec, PayloadCodec};
pub use kvtar_store::{ClientConfig, Entry, GatewayStore, InMemoryKvStore, KvStore};
