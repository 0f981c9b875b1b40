//! The versioned ciphertext envelope and its legacy (unversioned) variant.
//!
//! ```text
//! legacy:    <iv-hex>:<ciphertext-hex>
//! versioned: v<decimal-version>:<iv-hex>:<ciphertext-hex>
//! ```
//!
//! Both variants must parse indefinitely: data written before version
//! stamping existed has no embedded version and is decrypted by key fallback
//! instead of key selection. Shipping the versioned format without a blocking
//! one-time migration depends on that.

use crate::cipher::IV_HEX_LEN;
use crate::error::CryptoError;

/// A structurally-validated view over a ciphertext string. Borrows from the
/// input; no hex decoding happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    /// Embedded key version; `None` for the legacy variant.
    pub version: Option<u32>,
    pub iv_hex: &'a str,
    pub ciphertext_hex: &'a str,
}

impl<'a> Envelope<'a> {
    /// Parse a ciphertext string into its envelope parts.
    ///
    /// Accepts exactly two shapes: three `:`-parts whose first is
    /// `v<decimal>`, or two parts (legacy). The IV part must be exactly
    /// 24 hex chars and the ciphertext part non-empty with even length.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidFormat`] for every other shape.
    pub fn parse(s: &'a str) -> Result<Self, CryptoError> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            &[iv_hex, ciphertext_hex] => {
                validate_parts(iv_hex, ciphertext_hex)?;
                Ok(Envelope {
                    version: None,
                    iv_hex,
                    ciphertext_hex,
                })
            }
            &[tag, iv_hex, ciphertext_hex] => {
                let digits = tag.strip_prefix('v').ok_or_else(|| {
                    CryptoError::InvalidFormat("three-part ciphertext must start with 'v'".into())
                })?;
                let version: u32 = digits.parse().map_err(|_| {
                    CryptoError::InvalidFormat(format!("bad version tag 'v{digits}'"))
                })?;
                validate_parts(iv_hex, ciphertext_hex)?;
                Ok(Envelope {
                    version: Some(version),
                    iv_hex,
                    ciphertext_hex,
                })
            }
            _ => Err(CryptoError::InvalidFormat(format!(
                "expected 2 or 3 ':'-separated parts, got {}",
                parts.len()
            ))),
        }
    }
}

fn validate_parts(iv_hex: &str, ciphertext_hex: &str) -> Result<(), CryptoError> {
    if iv_hex.len() != IV_HEX_LEN {
        return Err(CryptoError::InvalidFormat(format!(
            "IV must be {IV_HEX_LEN} hex chars, got {}",
            iv_hex.len()
        )));
    }
    if ciphertext_hex.is_empty() || ciphertext_hex.len() % 2 != 0 {
        return Err(CryptoError::InvalidFormat(
            "ciphertext part must be non-empty with even length".into(),
        ));
    }
    Ok(())
}

impl std::fmt::Display for Envelope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.version {
            Some(v) => write!(f, "v{}:{}:{}", v, self.iv_hex, self.ciphertext_hex),
            None => write!(f, "{}:{}", self.iv_hex, self.ciphertext_hex),
        }
    }
}
