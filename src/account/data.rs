//! Path-addressed access to the account's free-form metadata document.
//!
//! Each operation loads the whole document, mutates it in memory via
//! [`crate::datapath`], and writes the whole document back.

use serde_json::Value;

use super::manager::AccountManager;
use super::store::AccountStore;
use super::types::AccountPatch;
use crate::datapath;
use crate::error::WardenError;

impl<S: AccountStore> AccountManager<S> {
    /// Returns the value at `path`, or `None` if any segment is missing.
    pub async fn data_get(&self, id: &str, path: &str) -> Result<Option<Value>, WardenError> {
        let record = self.record(id).await?;
        Ok(datapath::get(&record.data, path).cloned())
    }

    /// Assigns `value` at `path`, deep-creating intermediate objects.
    pub async fn data_set(&self, id: &str, path: &str, value: Value) -> Result<(), WardenError> {
        let mut record = self.record(id).await?;
        datapath::set(&mut record.data, path, value);
        self.persist_data(id, record.data).await
    }

    /// Removes the leaf at `path`; succeeds silently if the path is absent.
    pub async fn data_unset(&self, id: &str, path: &str) -> Result<(), WardenError> {
        let mut record = self.record(id).await?;
        datapath::unset(&mut record.data, path);
        self.persist_data(id, record.data).await
    }

    async fn persist_data(&self, id: &str, data: Value) -> Result<(), WardenError> {
        self.patch(
            id,
            AccountPatch {
                data: Some(data),
                ..Default::default()
            },
        )
        .await
    }
}
