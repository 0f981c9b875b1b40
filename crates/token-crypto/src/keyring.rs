//! Key material and the two-generation key ring.
//!
//! A [`KeyRing`] is built once per process (or per request) from
//! configuration and never mutated afterwards. During a rotation window it
//! holds both the current and the previous key so that ciphertext written
//! under either generation stays readable.

use crate::codec::hex_to_bytes;
use crate::error::CryptoError;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Fixed-size secret buffer holding exactly [`KEY_LEN`] bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which plaintext key material lives in RAM.
#[derive(Clone)]
pub struct KeyBytes(Box<[u8; KEY_LEN]>);

impl KeyBytes {
    /// Decode key material from its 64-hex-char configuration form.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] unless the string decodes to
    /// exactly [`KEY_LEN`] bytes.
    pub fn from_hex(key_hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex_to_bytes(key_hex)
            .map_err(|_| CryptoError::InvalidKey("key is not valid hex".into()))?;
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "key must be {KEY_LEN} bytes (64 hex chars), got {} bytes",
                bytes.len()
            )));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(&bytes);
        Ok(Self(buf))
    }

    /// Borrow the raw key bytes for the duration of a cipher call.
    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        // Zero the key material on drop.
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("KeyBytes([REDACTED])")
    }
}

/// One key generation: an integer version plus its secret. Immutable once
/// loaded.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    version: u32,
    key: KeyBytes,
}

impl KeyMaterial {
    /// Build key material from a version number and 64-hex-char secret.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if the secret is malformed.
    pub fn from_hex(version: u32, key_hex: &str) -> Result<Self, CryptoError> {
        Ok(Self {
            version,
            key: KeyBytes::from_hex(key_hex)?,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn key(&self) -> &KeyBytes {
        &self.key
    }
}

/// The current key plus, during a rotation window, the previous one.
#[derive(Debug, Clone)]
pub struct KeyRing {
    current: KeyMaterial,
    previous: Option<KeyMaterial>,
}

impl KeyRing {
    /// Assemble a ring from already-validated key material.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if the previous key carries the
    /// same version as the current one — the version is the selector embedded
    /// in ciphertext, so a duplicate would make key selection ambiguous.
    pub fn new(current: KeyMaterial, previous: Option<KeyMaterial>) -> Result<Self, CryptoError> {
        if let Some(prev) = &previous {
            if prev.version == current.version {
                return Err(CryptoError::InvalidKey(format!(
                    "current and previous keys share version {}",
                    current.version
                )));
            }
        }
        Ok(Self { current, previous })
    }

    pub fn current(&self) -> &KeyMaterial {
        &self.current
    }

    pub fn previous(&self) -> Option<&KeyMaterial> {
        self.previous.as_ref()
    }

    /// Look up the key whose version exactly matches `version`.
    ///
    /// Version match is a hard filter — there is no fallback between
    /// generations for versioned ciphertext.
    pub fn key_for_version(&self, version: u32) -> Option<&KeyBytes> {
        if self.current.version == version {
            return Some(&self.current.key);
        }
        match &self.previous {
            Some(prev) if prev.version == version => Some(&prev.key),
            _ => None,
        }
    }

    /// Versions this ring can serve, current first.
    pub fn available_versions(&self) -> Vec<u32> {
        let mut versions = vec![self.current.version];
        if let Some(prev) = &self.previous {
            versions.push(prev.version);
        }
        versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
    const KEY_B: &str = "202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f";

    #[test]
    fn key_bytes_from_valid_hex() {
        let key = KeyBytes::from_hex(KEY_A).unwrap();
        assert_eq!(key.as_slice().len(), KEY_LEN);
        assert_eq!(key.as_slice()[0], 0x00);
        assert_eq!(key.as_slice()[31], 0x1f);
    }

    #[test]
    fn short_key_rejected() {
        assert!(matches!(
            KeyBytes::from_hex("aabb"),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn non_hex_key_rejected() {
        let bad = "zz".repeat(32);
        assert!(matches!(
            KeyBytes::from_hex(&bad),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn key_bytes_redacted_in_debug() {
        let key = KeyBytes::from_hex(KEY_A).unwrap();
        assert!(format!("{key:?}").contains("REDACTED"));
        let material = KeyMaterial::from_hex(1, KEY_A).unwrap();
        assert!(!format!("{material:?}").contains("0001"));
    }

    #[test]
    fn ring_rejects_duplicate_versions() {
        let current = KeyMaterial::from_hex(2, KEY_A).unwrap();
        let previous = KeyMaterial::from_hex(2, KEY_B).unwrap();
        assert!(matches!(
            KeyRing::new(current, Some(previous)),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn key_for_version_selects_exactly() {
        let current = KeyMaterial::from_hex(2, KEY_A).unwrap();
        let previous = KeyMaterial::from_hex(1, KEY_B).unwrap();
        let ring = KeyRing::new(current, Some(previous)).unwrap();

        assert_eq!(ring.key_for_version(2).unwrap().as_slice()[0], 0x00);
        assert_eq!(ring.key_for_version(1).unwrap().as_slice()[0], 0x20);
        assert!(ring.key_for_version(3).is_none());
        assert_eq!(ring.available_versions(), vec![2, 1]);
    }

    #[test]
    fn ring_without_previous() {
        let current = KeyMaterial::from_hex(1, KEY_A).unwrap();
        let ring = KeyRing::new(current, None).unwrap();
        assert!(ring.previous().is_none());
        assert!(ring.key_for_version(0).is_none());
        assert_eq!(ring.available_versions(), vec![1]);
    }
}
