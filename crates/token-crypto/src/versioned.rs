//! Version-aware encrypt/decrypt over a [`KeyRing`].
//!
//! Key selection protocol:
//! - versioned ciphertext names its key generation; the match is exact or
//!   the operation fails — there is no cross-generation retry;
//! - legacy ciphertext names nothing, so the current key is tried first and
//!   the previous key second.

use crate::cipher;
use crate::error::CryptoError;
use crate::format::Envelope;
use crate::keyring::KeyRing;

/// Encrypt under the ring's current key, stamping the current version.
///
/// Every call draws a fresh IV, so encrypting the same plaintext twice yields
/// different ciphertext bytes — re-encryption is observable even when the
/// plaintext and version are unchanged.
///
/// # Errors
///
/// Propagates [`CryptoError`] from the underlying cipher.
pub fn encrypt_with_version(plaintext: &str, ring: &KeyRing) -> Result<String, CryptoError> {
    let inner = cipher::encrypt(plaintext, ring.current().key())?;
    Ok(format!("v{}:{}", ring.current().version(), inner))
}

/// Decrypt either envelope shape, selecting the key by embedded version.
///
/// Legacy ciphertext is tried against the current key first, then the
/// previous key. When both fail, the error from the **current**-key attempt
/// is surfaced; this precedence is load-bearing for callers and kept as-is.
///
/// # Errors
///
/// [`CryptoError::InvalidFormat`] on a malformed envelope,
/// [`CryptoError::KeyVersionNotFound`] when the stamped version matches
/// neither ring entry, [`CryptoError::DecryptionFailed`] on tag failure.
pub fn decrypt_with_version(ciphertext: &str, ring: &KeyRing) -> Result<String, CryptoError> {
    let envelope = Envelope::parse(ciphertext)?;
    match envelope.version {
        Some(version) => {
            let key = ring.key_for_version(version).ok_or_else(|| {
                CryptoError::KeyVersionNotFound {
                    requested: version,
                    available: ring.available_versions(),
                }
            })?;
            cipher::decrypt_parts(envelope.iv_hex, envelope.ciphertext_hex, key)
        }
        None => {
            match cipher::decrypt_parts(envelope.iv_hex, envelope.ciphertext_hex, ring.current().key())
            {
                Ok(plaintext) => Ok(plaintext),
                Err(first) => match ring.previous() {
                    Some(prev) => {
                        cipher::decrypt_parts(envelope.iv_hex, envelope.ciphertext_hex, prev.key())
                            .map_err(|_| first)
                    }
                    None => Err(first),
                },
            }
        }
    }
}

/// Parse-only check: is this ciphertext stamped with the ring's current
/// version?
///
/// Never decrypts and never fails: legacy ciphertext, garbage, and the empty
/// string all classify as `false`. Used as the non-destructive filter during
/// migration scans.
pub fn is_current_version(ciphertext: &str, ring: &KeyRing) -> bool {
    match Envelope::parse(ciphertext) {
        Ok(envelope) => envelope.version == Some(ring.current().version()),
        Err(_) => false,
    }
}

/// Decrypt with whatever key the ciphertext needs, then re-encrypt under the
/// current key and version.
///
/// Idempotent in plaintext effect, never in bytes: even an already-current
/// input comes back with a fresh IV and therefore different ciphertext.
///
/// # Errors
///
/// Propagates any [`CryptoError`] from either half of the round trip.
pub fn re_encrypt_with_current_version(
    ciphertext: &str,
    ring: &KeyRing,
) -> Result<String, CryptoError> {
    let plaintext = decrypt_with_version(ciphertext, ring)?;
    encrypt_with_version(&plaintext, ring)
}
