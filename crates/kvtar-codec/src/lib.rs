//! Codecs applied between the store and the filesystem.
//!
//! Two independent transforms live here:
//!
//! - [`KeyPathCodec`] maps store keys to file/archive names and back. Its
//!   only real work is the trailing-separator case: a key such as `a/b/` is
//!   a legitimate leaf in the store but cannot be a file name, so the
//!   trailing separator is swapped for a reserved placeholder character.
//! - [`PayloadCodec`] optionally base64-encodes values on their way into the
//!   store, for instances that reject or mangle binary payloads.
//!
//! The key codec never looks at values and the payload codec never looks at
//! keys.

pub mod error;
pub mod names;
pub mod payload;

pub use error::{CodecError, CodecResult};
pub use names::{KeyPathCodec, DEFAULT_PLACEHOLDER, DEFAULT_SEPARATOR};
pub use payload::PayloadCodec;
