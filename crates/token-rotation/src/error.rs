//! Error channel for the rotation job.

use thiserror::Error;
use token_crypto::CryptoError;

use crate::store::StoreError;

/// Anything that can fail while migrating a record: a crypto-layer error
/// during decrypt/re-encrypt, or a persistence error during fetch/update.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MigrationError {
    /// Stable code label for structured logs and batch reports. The four
    /// crypto codes pass through; storage failures collapse to `"store"`.
    pub fn code_label(&self) -> &'static str {
        match self {
            MigrationError::Crypto(e) => match e.code() {
                token_crypto::ErrorCode::InvalidFormat => "invalid_format",
                token_crypto::ErrorCode::InvalidKey => "invalid_key",
                token_crypto::ErrorCode::DecryptionFailed => "decryption_failed",
                token_crypto::ErrorCode::KeyVersionNotFound => "key_version_not_found",
            },
            MigrationError::Store(_) => "store",
        }
    }
}
