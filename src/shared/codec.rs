//! Template codec
//!
//! Merged fingerprint templates are opaque byte blobs from the vendor SDK.
//! The store keeps them as text, so they pass through base64 on the way in
//! and out. Both directions are pure; `decode` must only be fed strings this
//! codec produced.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Error decoding a stored template
#[derive(Error, Debug)]
pub enum CodecError {
    /// The stored string is not valid base64
    #[error("malformed template encoding: {0}")]
    Malformed(#[from] base64::DecodeError),
}

/// Encode raw template bytes for text storage
pub fn encode(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

/// Decode a stored template back to raw bytes
pub fn decode(encoded: &str) -> Result<Vec<u8>, CodecError> {
    Ok(STANDARD.decode(encoded)?)
}
