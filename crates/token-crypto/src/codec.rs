//! Byte ↔ hex conversion primitives.
//!
//! Every piece of the ciphertext format is carried as lowercase hex, so all
//! encode/decode paths funnel through these two functions and share one
//! error mapping.

use crate::error::CryptoError;

/// Encode bytes as lowercase hex, two digits per byte. Empty input yields the
/// empty string.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a lowercase/uppercase hex string back to bytes.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidFormat`] on odd length or non-hex characters.
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(s).map_err(|e| CryptoError::InvalidFormat(format!("bad hex: {e}")))
}
