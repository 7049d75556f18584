//! Error types for the transfer engine.

use kvtar_archive::ArchiveError;
use kvtar_codec::CodecError;
use kvtar_store::StoreError;

/// Errors surfaced by engine operations.
///
/// Nothing here terminates the process; the command layer decides exit
/// behavior.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A store primitive failed. Fatal for the whole invocation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A key or payload could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Codec(#[from] CodecError),

    /// Writing an archive/directory or walking a source failed.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Reading the confirmation answer or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or conflicting arguments, detected before any store call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operator declined a recursive removal.
    #[error("aborted: removal of {key:?} not confirmed")]
    Aborted { key: String },
}

impl EngineError {
    /// Usage errors are reported differently from runtime failures.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
