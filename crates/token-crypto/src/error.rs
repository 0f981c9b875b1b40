//! The crate-wide error taxonomy: one tagged type, four codes.

use serde::Serialize;
use thiserror::Error;

/// Errors produced by the encryption layer.
///
/// All four variants are recoverable by the caller; none should terminate the
/// process. Callers that need to branch should match on [`CryptoError::code`]
/// rather than on variant payloads.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Malformed ciphertext — corrupt or foreign data. Not retryable.
    #[error("invalid ciphertext format: {0}")]
    InvalidFormat(String),

    /// Key material is unusable — a configuration problem, fatal at startup.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Authentication-tag verification failed.
    ///
    /// Covers wrong key, corrupted ciphertext, and corrupted IV uniformly;
    /// the causes are deliberately indistinguishable so the error carries no
    /// oracle for an attacker.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Ciphertext references a key version that is neither current nor
    /// previous — a key was retired too early.
    #[error("no key available for ciphertext version {requested} (available: {available:?})")]
    KeyVersionNotFound {
        requested: u32,
        available: Vec<u32>,
    },
}

/// Stable machine-readable code for each [`CryptoError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidFormat,
    InvalidKey,
    DecryptionFailed,
    KeyVersionNotFound,
}

impl CryptoError {
    /// Returns the stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CryptoError::InvalidFormat(_) => ErrorCode::InvalidFormat,
            CryptoError::InvalidKey(_) => ErrorCode::InvalidKey,
            CryptoError::DecryptionFailed => ErrorCode::DecryptionFailed,
            CryptoError::KeyVersionNotFound { .. } => ErrorCode::KeyVersionNotFound,
        }
    }
}
