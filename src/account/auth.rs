//! The authentication decision procedure.
//!
//! Checks run in a fixed order, each one short-circuiting: unknown account,
//! administrative lock, active freeze window, credential comparison. Only the
//! comparison outcome touches counters; lock and freeze rejections are pure
//! reads.

use chrono::{Duration, Utc};
use tracing::warn;

use super::manager::AccountManager;
use super::store::AccountStore;
use crate::error::WardenError;
use crate::strategy::PasswordChecker;

impl<S: AccountStore> AccountManager<S> {
    /// Verifies `supplied` against the stored credential using the
    /// configured checker.
    pub async fn authenticate(&self, id: &str, supplied: &str) -> Result<(), WardenError> {
        let checker = self.checker.clone();
        self.authenticate_inner(id, supplied, checker.as_ref()).await
    }

    /// Same as [`authenticate`](Self::authenticate) but with a one-off
    /// comparison strategy, e.g. a challenge-response closure.
    pub async fn authenticate_with<C>(
        &self,
        id: &str,
        supplied: &str,
        compare: &C,
    ) -> Result<(), WardenError>
    where
        C: PasswordChecker + ?Sized,
    {
        self.authenticate_inner(id, supplied, compare).await
    }

    async fn authenticate_inner(
        &self,
        id: &str,
        supplied: &str,
        compare: &(impl PasswordChecker + ?Sized),
    ) -> Result<(), WardenError> {
        let record = self.record(id).await?;

        if record.locked {
            return Err(WardenError::AccountLocked(id.to_string()));
        }

        if let Some(frozen_at) = record.frozen_at {
            if record.current_freeze_time > 0
                && Utc::now() < frozen_at + Duration::milliseconds(record.current_freeze_time)
            {
                // Rejections inside the window do not re-arm it; only the
                // next failed attempt after expiry can trigger a new freeze.
                return Err(WardenError::AccountFrozen(id.to_string()));
            }
        }

        if !compare.check(supplied, &record.password_hash) {
            // The caller sees the rejection even if the bookkeeping write
            // fails underneath.
            if let Err(err) = self.record_failed_login(id).await {
                warn!(account = id, error = %err, "failed to record failed login");
            }
            return Err(WardenError::PasswordRejected);
        }

        // A reset failure never turns a successful login into an error.
        if let Err(err) = self.reset_login_attempts(id).await {
            warn!(account = id, error = %err, "failed to reset login attempts");
        }
        Ok(())
    }
}
