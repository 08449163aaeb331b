//! Failed-login tracking and the exponential freeze backoff.
//!
//! A freeze is triggered once `failed_logins` reaches `max_attempts` on a
//! lockable account. The first freeze in a chain uses the account's base
//! `freeze_time`; each further freeze while the chain is hot doubles the
//! window, without an upper bound. Capping the growth is caller policy.

use chrono::Utc;
use tracing::debug;

use super::manager::AccountManager;
use super::store::AccountStore;
use super::types::{AccountPatch, StoredAccount};
use crate::error::WardenError;

impl<S: AccountStore> AccountManager<S> {
    /// Counts one failed login and freezes the account if the threshold is
    /// reached. Accounts with `max_attempts == 0` or `lockable == false`
    /// accumulate failures forever and are never frozen.
    pub(crate) async fn record_failed_login(&self, id: &str) -> Result<(), WardenError> {
        self.store.increment_failed_logins(id).await?;
        let record = self.record(id).await?;
        if record.max_attempts > 0
            && record.lockable
            && record.failed_logins >= record.max_attempts
        {
            self.freeze(&record).await?;
        }
        Ok(())
    }

    async fn freeze(&self, record: &StoredAccount) -> Result<(), WardenError> {
        let mut window = 2 * record.current_freeze_time;
        if window == 0 {
            window = record.freeze_time;
        }
        debug!(account = record.id.as_str(), window_ms = window, "freezing account");
        self.patch(
            &record.id,
            AccountPatch {
                current_freeze_time: Some(window),
                frozen_at: Some(Some(Utc::now())),
                failed_logins: Some(0),
                ..Default::default()
            },
        )
        .await
    }

    /// Clears the failure counter and any freeze state in one write.
    /// Runs on successful authentication and on unlock.
    pub(crate) async fn reset_login_attempts(&self, id: &str) -> Result<(), WardenError> {
        self.patch(
            id,
            AccountPatch {
                failed_logins: Some(0),
                current_freeze_time: Some(0),
                frozen_at: Some(None),
                ..Default::default()
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::store::MemoryStore;
    use crate::account::types::NewAccount;
    use crate::config::WardenConfig;
    use std::time::Duration;

    fn manager() -> AccountManager<MemoryStore> {
        AccountManager::new(MemoryStore::new(), WardenConfig::default())
    }

    async fn fail_times(manager: &AccountManager<MemoryStore>, id: &str, n: u32) {
        for _ in 0..n {
            manager.authenticate(id, "fail").await.ok();
        }
    }

    #[tokio::test]
    async fn unlimited_accounts_accumulate_failures_without_freezing() {
        let manager = manager();
        manager
            .add(NewAccount::new("alexa", "123456").freeze_time(1000))
            .await
            .unwrap();

        fail_times(&manager, "alexa", 10).await;

        let account = manager.get("alexa").await.unwrap();
        assert_eq!(account.failed_logins, 10);
        assert_eq!(account.frozen_at, None);
        assert_eq!(account.current_freeze_time, 0);

        // Still authenticates fine.
        manager.authenticate("alexa", "123456").await.unwrap();
    }

    #[tokio::test]
    async fn non_lockable_accounts_are_never_frozen() {
        let manager = manager();
        manager
            .add(
                NewAccount::new("alexa", "123456")
                    .max_attempts(2)
                    .freeze_time(1000)
                    .lockable(false),
            )
            .await
            .unwrap();

        fail_times(&manager, "alexa", 6).await;

        let account = manager.get("alexa").await.unwrap();
        assert_eq!(account.failed_logins, 6);
        assert_eq!(account.frozen_at, None);
        manager.authenticate("alexa", "123456").await.unwrap();
    }

    #[tokio::test]
    async fn reaching_the_threshold_freezes_and_zeroes_the_counter() {
        let manager = manager();
        manager
            .add(NewAccount::new("alexa", "123456").max_attempts(3).freeze_time(60_000))
            .await
            .unwrap();

        fail_times(&manager, "alexa", 2).await;
        let account = manager.get("alexa").await.unwrap();
        assert_eq!(account.failed_logins, 2);
        assert_eq!(account.frozen_at, None);

        fail_times(&manager, "alexa", 1).await;
        let account = manager.get("alexa").await.unwrap();
        assert_eq!(account.failed_logins, 0);
        assert!(account.frozen_at.is_some());
        assert_eq!(account.current_freeze_time, 60_000);
    }

    #[tokio::test]
    async fn single_attempt_threshold_freezes_immediately() {
        let manager = manager();
        manager
            .add(NewAccount::new("alexa", "123456").max_attempts(1).freeze_time(60_000))
            .await
            .unwrap();

        fail_times(&manager, "alexa", 1).await;
        let account = manager.get("alexa").await.unwrap();
        assert!(account.frozen_at.is_some());
        assert_eq!(account.current_freeze_time, 60_000);
    }

    #[tokio::test]
    async fn backoff_doubles_across_consecutive_chains() {
        let manager = manager();
        // A 1ms base window expires between rounds, so each chain of two
        // failures triggers the next freeze in the sequence T, 2T, 4T.
        manager
            .add(NewAccount::new("alexa", "123456").max_attempts(2).freeze_time(1))
            .await
            .unwrap();

        for expected in [1i64, 2, 4] {
            fail_times(&manager, "alexa", 2).await;
            let account = manager.get("alexa").await.unwrap();
            assert_eq!(account.current_freeze_time, expected);
            assert!(account.frozen_at.is_some());
            assert_eq!(account.failed_logins, 0);
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
    }

    #[tokio::test]
    async fn success_resets_the_backoff_chain() {
        let manager = manager();
        manager
            .add(NewAccount::new("alexa", "123456").max_attempts(2).freeze_time(1))
            .await
            .unwrap();

        fail_times(&manager, "alexa", 2).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        manager.authenticate("alexa", "123456").await.unwrap();

        let account = manager.get("alexa").await.unwrap();
        assert_eq!(account.current_freeze_time, 0);
        assert_eq!(account.frozen_at, None);

        // The next chain starts over at the base window.
        fail_times(&manager, "alexa", 2).await;
        let account = manager.get("alexa").await.unwrap();
        assert_eq!(account.current_freeze_time, 1);
    }
}
