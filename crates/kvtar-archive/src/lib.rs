//! Archive sinks and directory sources for kvtar.
//!
//! # Architecture
//!
//! - **[`ArchiveSink`]**: receives an ordered stream of `(name, bytes)`
//!   entries and finalizes the destination on [`ArchiveSink::finish`]
//! - **[`DirectorySink`]**: mirrors names as a directory tree
//! - **[`TarSink`]**: TAR stream, optionally gzip-compressed
//! - **[`ZipSink`]**: ZIP container (needs a seekable destination)
//! - **[`DirectorySource`]**: walks local paths in a stable order and yields
//!   `(name, bytes)` entries for upload
//!
//! Sinks write entries in exactly the order they receive them. A failed
//! write aborts the whole transfer; the destination may be left truncated.

pub mod directory;
pub mod error;
pub mod sink;
pub mod source;
pub mod tarball;
pub mod zipfile;

pub use directory::DirectorySink;
pub use error::{ArchiveError, ArchiveResult};
pub use sink::{archive_path, member_name, write_all_then_finish, ArchiveSink};
pub use source::{DirectorySource, SourceEntry};
pub use tarball::TarSink;
pub use zipfile::ZipSink;
