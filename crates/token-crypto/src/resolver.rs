//! Key-ring resolution from environment configuration.
//!
//! All values are read from environment variables at startup. A missing or
//! malformed current key is a fatal configuration error, not a per-call
//! error: the process should refuse to start rather than limp along unable
//! to decrypt anything.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::keyring::{KeyMaterial, KeyRing};

/// Raw key configuration, prior to hex validation.
#[derive(Clone, Deserialize)]
pub struct KeyRingConfig {
    /// Current key, 64 hex chars. **Required.**
    pub encryption_key: String,

    /// Version stamped onto newly-written ciphertext.
    #[serde(default = "default_current_version")]
    pub encryption_key_version: u32,

    /// Previous key kept live during a rotation window. Optional; an empty
    /// string is treated as absent.
    #[serde(default)]
    pub encryption_key_previous: Option<String>,

    /// Version of the previous key.
    #[serde(default)]
    pub encryption_key_previous_version: u32,
}

fn default_current_version() -> u32 {
    1
}

impl KeyRingConfig {
    /// Load key configuration from `ENCRYPTION_KEY`, `ENCRYPTION_KEY_VERSION`,
    /// `ENCRYPTION_KEY_PREVIOUS`, and `ENCRYPTION_KEY_PREVIOUS_VERSION`.
    ///
    /// # Errors
    ///
    /// Returns an error if `ENCRYPTION_KEY` is absent or any value fails to
    /// parse.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: KeyRingConfig = cfg
            .try_deserialize()
            .context("failed to deserialise key configuration (is ENCRYPTION_KEY set?)")?;
        Ok(c)
    }

    /// Validate the key material and assemble a [`KeyRing`].
    ///
    /// # Errors
    ///
    /// Returns an error if the current key is empty or not 64 hex chars, if
    /// the previous key (when set) is malformed, or if both keys carry the
    /// same version.
    pub fn build_ring(&self) -> Result<KeyRing> {
        if self.encryption_key.trim().is_empty() {
            anyhow::bail!("ENCRYPTION_KEY is required and must not be empty");
        }
        let current = KeyMaterial::from_hex(self.encryption_key_version, &self.encryption_key)
            .context("ENCRYPTION_KEY is not a valid 64-hex-char key")?;

        let previous = match self.encryption_key_previous.as_deref() {
            None | Some("") => None,
            Some(prev_hex) => Some(
                KeyMaterial::from_hex(self.encryption_key_previous_version, prev_hex)
                    .context("ENCRYPTION_KEY_PREVIOUS is not a valid 64-hex-char key")?,
            ),
        };

        KeyRing::new(current, previous).context("key ring configuration is inconsistent")
    }
}

impl std::fmt::Debug for KeyRingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key hex never reaches logs, even at debug level.
        f.debug_struct("KeyRingConfig")
            .field("encryption_key", &"[REDACTED]")
            .field("encryption_key_version", &self.encryption_key_version)
            .field(
                "encryption_key_previous",
                &self.encryption_key_previous.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "encryption_key_previous_version",
                &self.encryption_key_previous_version,
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
    const KEY_B: &str = "202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f";

    fn base_config() -> KeyRingConfig {
        KeyRingConfig {
            encryption_key: KEY_A.into(),
            encryption_key_version: default_current_version(),
            encryption_key_previous: None,
            encryption_key_previous_version: 0,
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_current_version(), 1);
    }

    #[test]
    fn builds_current_only_ring() {
        let ring = base_config().build_ring().unwrap();
        assert_eq!(ring.current().version(), 1);
        assert!(ring.previous().is_none());
    }

    #[test]
    fn builds_two_key_ring() {
        let mut cfg = base_config();
        cfg.encryption_key = KEY_B.into();
        cfg.encryption_key_version = 2;
        cfg.encryption_key_previous = Some(KEY_A.into());
        cfg.encryption_key_previous_version = 1;
        let ring = cfg.build_ring().unwrap();
        assert_eq!(ring.current().version(), 2);
        assert_eq!(ring.previous().unwrap().version(), 1);
    }

    #[test]
    fn empty_current_key_rejected() {
        let mut cfg = base_config();
        cfg.encryption_key = "   ".into();
        assert!(cfg.build_ring().is_err());
    }

    #[test]
    fn empty_previous_key_treated_as_absent() {
        let mut cfg = base_config();
        cfg.encryption_key_previous = Some(String::new());
        let ring = cfg.build_ring().unwrap();
        assert!(ring.previous().is_none());
    }

    #[test]
    fn malformed_previous_key_rejected() {
        let mut cfg = base_config();
        cfg.encryption_key_previous = Some("deadbeef".into());
        assert!(cfg.build_ring().is_err());
    }

    #[test]
    fn duplicate_versions_rejected() {
        let mut cfg = base_config();
        cfg.encryption_key_version = 1;
        cfg.encryption_key_previous = Some(KEY_B.into());
        cfg.encryption_key_previous_version = 1;
        assert!(cfg.build_ring().is_err());
    }

    #[test]
    fn debug_output_redacts_keys() {
        let mut cfg = base_config();
        cfg.encryption_key_previous = Some(KEY_B.into());
        let rendered = format!("{cfg:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains(KEY_A));
        assert!(!rendered.contains(KEY_B));
    }
}
