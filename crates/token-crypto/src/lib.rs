//! Versioned AES-256-GCM encryption for long-lived OAuth secrets at rest.
//!
//! This crate is intentionally free of storage and HTTP dependencies. It
//! provides the cipher, the on-disk ciphertext format, and the key-selection
//! protocol that must stay correct while two key generations are live at once.
//!
//! # Ciphertext formats
//!
//! ```text
//! legacy:    <24-hex-char-iv>:<hex(ciphertext+tag)>
//! versioned: v<decimal-version>:<24-hex-char-iv>:<hex(ciphertext+tag)>
//! ```
//!
//! The `v<n>` prefix names the key generation that produced the ciphertext,
//! so a process holding a [`KeyRing`] can decrypt data written under either
//! the current or the previous key. Legacy (unversioned) ciphertext predates
//! the prefix and stays decryptable indefinitely via key fallback.

pub mod cipher;
pub mod codec;
pub mod error;
pub mod format;
pub mod keyring;
pub mod resolver;
pub mod versioned;

pub use error::{CryptoError, ErrorCode};
pub use keyring::{KeyBytes, KeyMaterial, KeyRing, KEY_LEN};
pub use resolver::KeyRingConfig;
