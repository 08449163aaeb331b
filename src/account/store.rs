//! Storage seam for account records.
//!
//! The manager only talks to this trait; backends decide how the
//! read-modify-write sequences are made safe. Both shipped backends apply
//! each `update`/`increment`/`rename` atomically per record: [`MemoryStore`]
//! holds its write lock for the whole operation, and the sled backend in
//! [`crate::storage`] runs them inside transactions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::cmp::Ordering;
use thiserror::Error;
use tokio::sync::RwLock;

use super::types::{AccountPatch, SortDirection, SortField, SortKey, StoredAccount};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate record: {0}")]
    Duplicate(String),
    #[error("no record for id: {0}")]
    NotFound(String),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Durable keyed storage for account records.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<StoredAccount>, StoreError>;

    /// Inserts a new record. Fails with [`StoreError::Duplicate`] without
    /// mutating anything if the id is already present.
    async fn insert(&self, record: StoredAccount) -> Result<(), StoreError>;

    /// Applies `patch` to the record as a single atomic write. Returns false
    /// if the id is absent.
    async fn update(&self, id: &str, patch: AccountPatch) -> Result<bool, StoreError>;

    /// Atomically adds one to `failed_logins`.
    async fn increment_failed_logins(&self, id: &str) -> Result<(), StoreError>;

    /// Changes the primary key, preserving every other field.
    async fn rename(&self, id: &str, new_id: &str) -> Result<(), StoreError>;

    /// Returns whether a record was actually removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn list(
        &self,
        offset: usize,
        limit: Option<usize>,
        order: &[SortKey],
    ) -> Result<Vec<StoredAccount>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// Sorts records by the given keys, falling back to creation time ascending
/// when no key is given.
pub(crate) fn order_records(records: &mut [StoredAccount], order: &[SortKey]) {
    const DEFAULT_ORDER: [SortKey; 1] = [SortKey {
        field: SortField::Created,
        direction: SortDirection::Ascending,
    }];
    let keys = if order.is_empty() { &DEFAULT_ORDER } else { order };
    records.sort_by(|a, b| {
        for key in keys {
            let ord = match key.direction {
                SortDirection::Ascending => key.field.compare(a, b),
                SortDirection::Descending => key.field.compare(a, b).reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

pub(crate) fn paginate(
    mut records: Vec<StoredAccount>,
    offset: usize,
    limit: Option<usize>,
    order: &[SortKey],
) -> Vec<StoredAccount> {
    order_records(&mut records, order);
    records
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// In-memory store backed by a `HashMap`. Each trait method takes the write
/// lock for its whole read-modify-write, so every operation is atomic with
/// respect to concurrent callers.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, StoredAccount>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<StoredAccount>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn insert(&self, record: StoredAccount) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn update(&self, id: &str, patch: AccountPatch) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) => {
                patch.apply(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increment_failed_logins(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.failed_logins = record.failed_logins.saturating_add(1);
        Ok(())
    }

    async fn rename(&self, id: &str, new_id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(new_id) {
            return Err(StoreError::Duplicate(new_id.to_string()));
        }
        let mut record = records
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.id = new_id.to_string();
        records.insert(new_id.to_string(), record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(id).is_some())
    }

    async fn list(
        &self,
        offset: usize,
        limit: Option<usize>,
        order: &[SortKey],
    ) -> Result<Vec<StoredAccount>, StoreError> {
        let records: Vec<StoredAccount> = self.records.read().await.values().cloned().collect();
        Ok(paginate(records, offset, limit, order))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.read().await.len() as u64)
    }
}
