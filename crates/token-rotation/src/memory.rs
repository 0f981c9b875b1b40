//! In-memory [`ConnectionStore`] for tests and for embedding hosts that have
//! no database wired up yet.
//!
//! Backed by a `BTreeMap` keyed by record id, which gives the stable ordering
//! the paging contract requires for free.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{ConnectionRecord, ConnectionStore, StoreError, TokenUpdate};

/// Thread-safe in-memory record store.
#[derive(Clone, Default)]
pub struct InMemoryConnectionStore {
    records: Arc<RwLock<BTreeMap<String, ConnectionRecord>>>,
}

impl InMemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub async fn insert(&self, record: ConnectionRecord) {
        let mut records = self.records.write().await;
        records.insert(record.id.clone(), record);
    }

    /// Snapshot one record by id.
    pub async fn get(&self, id: &str) -> Option<ConnectionRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Snapshot every record, in id order.
    pub async fn all(&self) -> Vec<ConnectionRecord> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ConnectionRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.values().skip(offset).take(limit).cloned().collect())
    }

    async fn update_tokens(&self, id: &str, update: TokenUpdate) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(access_token) = update.access_token {
            record.access_token = access_token;
        }
        if let Some(refresh_token) = update.refresh_token {
            record.refresh_token = refresh_token;
        }
        Ok(())
    }
}
