//! Administrative locking, independent of the freeze machinery.

use super::manager::AccountManager;
use super::store::AccountStore;
use super::types::AccountPatch;
use crate::error::WardenError;

impl<S: AccountStore> AccountManager<S> {
    /// Locks the account. Fails for accounts with `lockable == false`.
    /// Freeze counters are left as they are.
    pub async fn lock(&self, id: &str) -> Result<(), WardenError> {
        let record = self.record(id).await?;
        if !record.lockable {
            return Err(WardenError::NotLockable(id.to_string()));
        }
        self.patch(
            id,
            AccountPatch {
                locked: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    /// Unlocks the account and clears all login-attempt state, whether or
    /// not it was frozen.
    pub async fn unlock(&self, id: &str) -> Result<(), WardenError> {
        self.patch(
            id,
            AccountPatch {
                locked: Some(false),
                ..Default::default()
            },
        )
        .await?;
        self.reset_login_attempts(id).await
    }

    pub async fn set_lockable(&self, id: &str) -> Result<(), WardenError> {
        self.patch(
            id,
            AccountPatch {
                lockable: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    /// Marks the account non-lockable and unlocks it; an account that cannot
    /// be locked is never left in a locked state.
    pub async fn set_unlockable(&self, id: &str) -> Result<(), WardenError> {
        self.patch(
            id,
            AccountPatch {
                lockable: Some(false),
                ..Default::default()
            },
        )
        .await?;
        self.unlock(id).await
    }
}
