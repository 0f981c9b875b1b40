//! The persistence seam: what the rotation job needs from a record store.
//!
//! No query language or storage engine is assumed. A backend must provide a
//! stable-ordered paged read and an atomic single-row, field-subset update;
//! everything else — transactions, retries, connection pooling — stays on the
//! backend's side of the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// One persisted provider connection. The two token fields are independent
/// ciphertexts and may sit at different key versions simultaneously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Field-subset write: only `Some` fields are touched by the update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUpdate {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenUpdate {
    /// True when the update would touch nothing.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Errors surfaced by a [`ConnectionStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists with the given id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The backend failed; message is backend-specific.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Read/write access the rotation job requires, per record.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Fetch up to `limit` records starting at `offset`, ordered by a stable
    /// key (the record id). The ordering contract is what makes offset-based
    /// resumption sound.
    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ConnectionRecord>, StoreError>;

    /// Atomically update a subset of one record's token fields by primary key.
    async fn update_tokens(&self, id: &str, update: TokenUpdate) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_detected() {
        assert!(TokenUpdate::default().is_empty());
        let partial = TokenUpdate {
            access_token: Some("v2:aa:bb".into()),
            refresh_token: None,
        };
        assert!(!partial.is_empty());
    }

    #[test]
    fn record_serialises_round_trip() {
        let rec = ConnectionRecord {
            id: "conn-1".into(),
            access_token: "v1:00112233445566778899aabb:cafe".into(),
            refresh_token: "00112233445566778899aabb:beef".into(),
        };
        let json = serde_json::to_string(&rec).unwrap();
        let back: ConnectionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
