//! Optional reversible text encoding of values.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::CodecResult;

/// Transform applied to values between the filesystem and the store.
///
/// `to_storage` runs on upload/put, `from_storage` on get/dump/archive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PayloadCodec {
    /// Bytes pass through untouched.
    #[default]
    Identity,
    /// Standard base64 with padding.
    Base64,
}

impl PayloadCodec {
    /// `Base64` when `enabled`, `Identity` otherwise.
    pub fn base64_if(enabled: bool) -> Self {
        if enabled {
            Self::Base64
        } else {
            Self::Identity
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }

    /// Encode raw bytes for storage. Never fails.
    pub fn to_storage(&self, raw: &[u8]) -> Vec<u8> {
        match self {
            Self::Identity => raw.to_vec(),
            Self::Base64 => BASE64.encode(raw).into_bytes(),
        }
    }

    /// Decode stored bytes back to raw form.
    pub fn from_storage(&self, stored: &[u8]) -> CodecResult<Vec<u8>> {
        match self {
            Self::Identity => Ok(stored.to_vec()),
            Self::Base64 => Ok(BASE64.decode(stored)?),
        }
    }

    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Identity => "",
            Self::Base64 => ", base64",
        }
    }
}
