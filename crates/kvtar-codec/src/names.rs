//! Store key <-> file name mapping.
//!
//! Rules:
//! - A key ending in the separator has that one trailing separator replaced
//!   by the placeholder (`a/b/` -> `a/b⁄`)
//! - Every other key maps to itself
//! - Decoding reverses the substitution on a trailing placeholder only
//! - Empty keys and names are rejected
//!
//! `decode(encode(k)) == k` holds for every key that does not already contain
//! the placeholder. Keys that do are ambiguous and out of contract; use
//! [`KeyPathCodec::contains_placeholder`] to spot them.

use crate::error::{CodecError, CodecResult};

/// Key path separator used by the store.
pub const DEFAULT_SEPARATOR: char = '/';

/// U+2044 FRACTION SLASH. Looks like a slash, is not one to any filesystem.
pub const DEFAULT_PLACEHOLDER: char = '\u{2044}';

/// Bidirectional mapping between store keys and archive/file names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPathCodec {
    separator: char,
    placeholder: char,
}

impl Default for KeyPathCodec {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            placeholder: DEFAULT_PLACEHOLDER,
        }
    }
}

impl KeyPathCodec {
    /// Codec with a custom separator and placeholder.
    ///
    /// Returns `None` when both characters are equal.
    pub fn new(separator: char, placeholder: char) -> Option<Self> {
        (separator != placeholder).then_some(Self {
            separator,
            placeholder,
        })
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn placeholder(&self) -> char {
        self.placeholder
    }

    /// Map a store key to a name usable as a file path or archive member.
    ///
    /// # Examples
    ///
    /// ```
    /// use kvtar_codec::KeyPathCodec;
    ///
    /// let codec = KeyPathCodec::default();
    /// assert_eq!(codec.encode(b"cfg/a").unwrap(), "cfg/a");
    /// assert_eq!(codec.encode(b"cfg/sub/").unwrap(), "cfg/sub\u{2044}");
    /// assert!(codec.encode(b"").is_err());
    /// ```
    pub fn encode(&self, key: &[u8]) -> CodecResult<String> {
        if key.is_empty() {
            return Err(CodecError::InvalidKey("empty key".into()));
        }
        let text = std::str::from_utf8(key)
            .map_err(|_| CodecError::NonUtf8Key(String::from_utf8_lossy(key).into_owned()))?;

        match text.strip_suffix(self.separator) {
            Some(stem) => {
                let mut name = String::with_capacity(text.len() + self.placeholder.len_utf8());
                name.push_str(stem);
                name.push(self.placeholder);
                Ok(name)
            }
            None => Ok(text.to_string()),
        }
    }

    /// Map a file or archive name back to the store key it came from.
    ///
    /// # Examples
    ///
    /// ```
    /// use kvtar_codec::KeyPathCodec;
    ///
    /// let codec = KeyPathCodec::default();
    /// assert_eq!(codec.decode("cfg/sub\u{2044}").unwrap(), "cfg/sub/");
    /// assert_eq!(codec.decode("cfg/a").unwrap(), "cfg/a");
    /// ```
    pub fn decode(&self, name: &str) -> CodecResult<String> {
        if name.is_empty() {
            return Err(CodecError::InvalidKey("empty name".into()));
        }
        match name.strip_suffix(self.placeholder) {
            Some(stem) => {
                let mut key = String::with_capacity(name.len());
                key.push_str(stem);
                key.push(self.separator);
                Ok(key)
            }
            None => Ok(name.to_string()),
        }
    }

    /// Whether `key` is a trailing-separator ("directory marker") key.
    pub fn is_directory_key(&self, key: &[u8]) -> bool {
        let mut buf = [0u8; 4];
        key.ends_with(self.separator.encode_utf8(&mut buf).as_bytes())
    }

    /// Whether `key` already carries the placeholder and so cannot round-trip.
    pub fn contains_placeholder(&self, key: &[u8]) -> bool {
        let mut buf = [0u8; 4];
        let needle = self.placeholder.encode_utf8(&mut buf).as_bytes();
        key.windows(needle.len()).any(|w| w == needle)
    }
}
