//! AES-256-GCM encryption and decryption of individual token strings.
//!
//! A fresh 96-bit IV is generated from the OS CSPRNG on **every** encrypt
//! call. GCM nonce reuse under the same key is catastrophic — it breaks both
//! confidentiality and authentication — so the IV is never cached or derived
//! deterministically. The 16-byte authentication tag the AEAD produces is
//! appended to the ciphertext bytes before hex encoding.
//!
//! The output shape here is the *legacy* (unversioned) envelope:
//!
//! ```text
//! <hex(iv)>:<hex(ciphertext+tag)>
//! ```
//!
//! Version stamping lives one layer up, in [`crate::versioned`].

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};

use crate::codec::{bytes_to_hex, hex_to_bytes};
use crate::error::CryptoError;
use crate::keyring::KeyBytes;

/// Byte length of an AES-GCM IV (12 bytes = 96 bits).
pub const IV_LEN: usize = 12;

/// Hex length of the IV portion of every envelope.
pub const IV_HEX_LEN: usize = IV_LEN * 2;

/// Encrypt a plaintext token, returning the legacy `iv:ciphertext` envelope.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKey`] on an internal AEAD setup error
/// (unreachable with a [`KeyBytes`]-validated key).
pub fn encrypt(plaintext: &str, key: &KeyBytes) -> Result<String, CryptoError> {
    let cipher = build_cipher(key)?;

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);

    // Unreachable with a validated key and fresh nonce.
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| CryptoError::InvalidKey("aead encryption failure".into()))?;

    Ok(format!("{}:{}", bytes_to_hex(&iv), bytes_to_hex(&ciphertext)))
}

/// Decrypt a legacy `iv:ciphertext` envelope back to the plaintext token.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidFormat`] unless the input splits into
/// exactly two non-empty `:`-parts with a 24-hex-char IV part.
/// Returns [`CryptoError::DecryptionFailed`] if tag verification fails —
/// wrong key, corrupted ciphertext, and corrupted IV are indistinguishable.
pub fn decrypt(ciphertext: &str, key: &KeyBytes) -> Result<String, CryptoError> {
    let parts: Vec<&str> = ciphertext.split(':').collect();
    match parts.as_slice() {
        &[iv_hex, ct_hex] if !iv_hex.is_empty() && !ct_hex.is_empty() => {
            decrypt_parts(iv_hex, ct_hex, key)
        }
        _ => Err(CryptoError::InvalidFormat(
            "expected exactly two non-empty ':'-separated parts".into(),
        )),
    }
}

/// Decrypt from already-split IV and ciphertext hex parts.
///
/// Shared by the legacy path above and the version-aware codec, which has
/// already parsed the envelope.
pub(crate) fn decrypt_parts(
    iv_hex: &str,
    ct_hex: &str,
    key: &KeyBytes,
) -> Result<String, CryptoError> {
    if iv_hex.len() != IV_HEX_LEN {
        return Err(CryptoError::InvalidFormat(format!(
            "IV must be {IV_HEX_LEN} hex chars, got {}",
            iv_hex.len()
        )));
    }
    let iv = hex_to_bytes(iv_hex)?;
    let ciphertext = hex_to_bytes(ct_hex)?;

    let cipher = build_cipher(key)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
        .map_err(|_| CryptoError::DecryptionFailed)?;

    // Tokens are UTF-8 at encrypt time; anything else means foreign data.
    // Kept in the no-oracle bucket rather than InvalidFormat.
    String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
}

fn build_cipher(key: &KeyBytes) -> Result<Aes256Gcm, CryptoError> {
    Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|_| CryptoError::InvalidKey("key has unexpected length".into()))
}
