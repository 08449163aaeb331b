//! Sled-backed account store.
//!
//! Records are stored JSON-encoded in a single tree keyed by account id.
//! Inserts go through compare-and-swap and every read-modify-write runs in a
//! sled transaction, so concurrent mutations of the same record serialize at
//! the store instead of racing.

use async_trait::async_trait;
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult, TransactionError};

use crate::account::store::{paginate, AccountStore, StoreError};
use crate::account::types::{AccountPatch, SortKey, StoredAccount};

pub struct SledStore {
    tree: sled::Tree,
}

impl SledStore {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::from_db(&db)
    }

    /// An ephemeral store that disappears on drop. Used by tests.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::from_db(&db)
    }

    fn from_db(db: &sled::Db) -> Result<Self, StoreError> {
        let tree = db
            .open_tree("accounts")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { tree })
    }
}

fn encode(record: &StoredAccount) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(record).map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<StoredAccount, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Codec(e.to_string()))
}

fn run_tx<T>(result: Result<T, TransactionError<StoreError>>) -> Result<T, StoreError> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(StoreError::Backend(err.to_string())),
    }
}

#[async_trait]
impl AccountStore for SledStore {
    async fn get(&self, id: &str) -> Result<Option<StoredAccount>, StoreError> {
        match self
            .tree
            .get(id.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, record: StoredAccount) -> Result<(), StoreError> {
        let bytes = encode(&record)?;
        match self
            .tree
            .compare_and_swap(record.id.as_bytes(), None as Option<&[u8]>, Some(bytes))
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(StoreError::Duplicate(record.id)),
            Err(err) => Err(StoreError::Backend(err.to_string())),
        }
    }

    async fn update(&self, id: &str, patch: AccountPatch) -> Result<bool, StoreError> {
        run_tx(self.tree.transaction(
            |tx| -> ConflictableTransactionResult<bool, StoreError> {
                let Some(bytes) = tx.get(id.as_bytes())? else {
                    return Ok(false);
                };
                let mut record = decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                patch.apply(&mut record);
                tx.insert(
                    id.as_bytes(),
                    encode(&record).map_err(ConflictableTransactionError::Abort)?,
                )?;
                Ok(true)
            },
        ))
    }

    async fn increment_failed_logins(&self, id: &str) -> Result<(), StoreError> {
        run_tx(self.tree.transaction(
            |tx| -> ConflictableTransactionResult<(), StoreError> {
                let Some(bytes) = tx.get(id.as_bytes())? else {
                    return Err(ConflictableTransactionError::Abort(StoreError::NotFound(
                        id.to_string(),
                    )));
                };
                let mut record = decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                record.failed_logins = record.failed_logins.saturating_add(1);
                tx.insert(
                    id.as_bytes(),
                    encode(&record).map_err(ConflictableTransactionError::Abort)?,
                )?;
                Ok(())
            },
        ))
    }

    async fn rename(&self, id: &str, new_id: &str) -> Result<(), StoreError> {
        run_tx(self.tree.transaction(
            |tx| -> ConflictableTransactionResult<(), StoreError> {
                let Some(bytes) = tx.get(id.as_bytes())? else {
                    return Err(ConflictableTransactionError::Abort(StoreError::NotFound(
                        id.to_string(),
                    )));
                };
                if tx.get(new_id.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StoreError::Duplicate(
                        new_id.to_string(),
                    )));
                }
                let mut record = decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                record.id = new_id.to_string();
                tx.remove(id.as_bytes())?;
                tx.insert(
                    new_id.as_bytes(),
                    encode(&record).map_err(ConflictableTransactionError::Abort)?,
                )?;
                Ok(())
            },
        ))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .tree
            .remove(id.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .is_some())
    }

    async fn list(
        &self,
        offset: usize,
        limit: Option<usize>,
        order: &[SortKey],
    ) -> Result<Vec<StoredAccount>, StoreError> {
        let mut records = Vec::new();
        for entry in self.tree.iter() {
            let (_, bytes) = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
            records.push(decode(&bytes)?);
        }
        Ok(paginate(records, offset, limit, order))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.tree.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::types::SortField;
    use chrono::Utc;
    use serde_json::json;

    fn record(id: &str) -> StoredAccount {
        let now = Utc::now();
        StoredAccount {
            id: id.to_string(),
            password_hash: "123456".to_string(),
            created: now,
            password_changed: now,
            locked: false,
            lockable: true,
            max_attempts: 3,
            failed_logins: 0,
            frozen_at: None,
            current_freeze_time: 0,
            freeze_time: 1000,
            data: json!({"name": {"first": id}}),
        }
    }

    #[tokio::test]
    async fn round_trips_records_including_metadata() {
        let store = SledStore::temporary().unwrap();
        store.insert(record("alexa")).await.unwrap();

        let loaded = store.get("alexa").await.unwrap().unwrap();
        assert_eq!(loaded.id, "alexa");
        assert_eq!(loaded.password_hash, "123456");
        assert_eq!(loaded.data, json!({"name": {"first": "alexa"}}));
        assert_eq!(loaded.frozen_at, None);
    }

    #[tokio::test]
    async fn insert_is_first_writer_wins() {
        let store = SledStore::temporary().unwrap();
        store.insert(record("alexa")).await.unwrap();
        assert!(matches!(
            store.insert(record("alexa")).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn update_and_increment_apply_in_place() {
        let store = SledStore::temporary().unwrap();
        store.insert(record("alexa")).await.unwrap();

        let frozen_at = Utc::now();
        let patch = AccountPatch {
            failed_logins: Some(0),
            current_freeze_time: Some(2000),
            frozen_at: Some(Some(frozen_at)),
            ..Default::default()
        };
        assert!(store.update("alexa", patch).await.unwrap());

        store.increment_failed_logins("alexa").await.unwrap();
        store.increment_failed_logins("alexa").await.unwrap();

        let loaded = store.get("alexa").await.unwrap().unwrap();
        assert_eq!(loaded.failed_logins, 2);
        assert_eq!(loaded.current_freeze_time, 2000);
        assert_eq!(loaded.frozen_at, Some(frozen_at));
    }

    #[tokio::test]
    async fn increment_of_a_missing_record_fails() {
        let store = SledStore::temporary().unwrap();
        assert!(matches!(
            store.increment_failed_logins("ghost").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rename_preserves_the_record_body() {
        let store = SledStore::temporary().unwrap();
        store.insert(record("alexa")).await.unwrap();

        store.rename("alexa", "admin").await.unwrap();

        assert!(store.get("alexa").await.unwrap().is_none());
        let moved = store.get("admin").await.unwrap().unwrap();
        assert_eq!(moved.id, "admin");
        assert_eq!(moved.data, json!({"name": {"first": "alexa"}}));
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = std::sync::Arc::new(SledStore::temporary().unwrap());
        store.insert(record("alexa")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..5 {
                    store.increment_failed_logins("alexa").await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let loaded = store.get("alexa").await.unwrap().unwrap();
        assert_eq!(loaded.failed_logins, 40);
    }

    #[tokio::test]
    async fn list_and_count_cover_the_whole_tree() {
        let store = SledStore::temporary().unwrap();
        for id in ["jerry", "alexa", "admin"] {
            store.insert(record(id)).await.unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 3);
        let rows = store
            .list(0, None, &[SortKey::asc(SortField::Id)])
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["admin", "alexa", "jerry"]);
    }
}
