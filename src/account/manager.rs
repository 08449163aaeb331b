//! Account lifecycle: creation, removal, rename, password change, listing.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::store::AccountStore;
use super::types::{Account, AccountPatch, ListOptions, NewAccount, StoredAccount};
use crate::config::WardenConfig;
use crate::error::WardenError;
use crate::strategy::{Equality, Identity, PasswordChecker, PasswordHasher};

/// Owns account records and enforces the credential state machine.
///
/// Holds no mutable state of its own; everything lives in the store, so one
/// manager can be shared freely across tasks.
pub struct AccountManager<S> {
    pub(crate) store: S,
    pub(crate) config: WardenConfig,
    pub(crate) hasher: Arc<dyn PasswordHasher>,
    pub(crate) checker: Arc<dyn PasswordChecker>,
}

impl<S: AccountStore> AccountManager<S> {
    /// Creates a manager with the identity/equality placeholder strategies.
    /// Swap in real ones with [`with_hasher`](Self::with_hasher) and
    /// [`with_checker`](Self::with_checker) before production use.
    pub fn new(store: S, config: WardenConfig) -> Self {
        Self {
            store,
            config,
            hasher: Arc::new(Identity),
            checker: Arc::new(Equality),
        }
    }

    pub fn with_hasher(mut self, hasher: impl PasswordHasher + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    pub fn with_checker(mut self, checker: impl PasswordChecker + 'static) -> Self {
        self.checker = Arc::new(checker);
        self
    }

    /// Loads the full record, credential included. Crate-internal; the
    /// public surface returns [`Account`] views.
    pub(crate) async fn record(&self, id: &str) -> Result<StoredAccount, WardenError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| WardenError::UnknownAccount(id.to_string()))
    }

    /// Applies a patch, mapping a missing id to `UnknownAccount`.
    pub(crate) async fn patch(&self, id: &str, patch: AccountPatch) -> Result<(), WardenError> {
        if self.store.update(id, patch).await? {
            Ok(())
        } else {
            Err(WardenError::UnknownAccount(id.to_string()))
        }
    }

    /// Creates an account. The supplied plaintext is hashed with the
    /// configured strategy; counters start at zero and the metadata document
    /// starts empty regardless of input.
    pub async fn add(&self, new: NewAccount) -> Result<(), WardenError> {
        let now = Utc::now();
        let record = StoredAccount {
            password_hash: self.hasher.hash(&new.password)?,
            id: new.id,
            created: now,
            password_changed: now,
            locked: new.locked.unwrap_or(false),
            lockable: new.lockable.unwrap_or(true),
            max_attempts: new.max_attempts.unwrap_or(self.config.max_attempts),
            failed_logins: 0,
            frozen_at: None,
            current_freeze_time: 0,
            freeze_time: new.freeze_time.unwrap_or(self.config.freeze_time),
            data: Value::Object(Map::new()),
        };
        self.store.insert(record).await?;
        Ok(())
    }

    /// Deletes the account. Succeeds whether or not the id existed.
    pub async fn remove(&self, id: &str) -> Result<(), WardenError> {
        self.store.delete(id).await?;
        Ok(())
    }

    /// Changes the primary key, preserving all other fields.
    pub async fn rename(&self, id: &str, new_id: &str) -> Result<(), WardenError> {
        self.record(id).await?;
        self.store.rename(id, new_id).await?;
        Ok(())
    }

    /// Re-hashes and stores a new password, moving `password_changed`.
    /// Lock and freeze state are untouched.
    pub async fn set_password(&self, id: &str, plaintext: &str) -> Result<(), WardenError> {
        let patch = AccountPatch {
            password_hash: Some(self.hasher.hash(plaintext)?),
            password_changed: Some(Utc::now()),
            ..Default::default()
        };
        self.patch(id, patch).await
    }

    pub async fn get(&self, id: &str) -> Result<Account, WardenError> {
        Ok(self.record(id).await?.into())
    }

    pub async fn list(&self, options: ListOptions) -> Result<Vec<Account>, WardenError> {
        let records = self
            .store
            .list(options.offset, options.limit, &options.order_by)
            .await?;
        Ok(records.into_iter().map(Account::from).collect())
    }

    pub async fn count(&self) -> Result<u64, WardenError> {
        Ok(self.store.count().await?)
    }
}
