//! Account record types and listing options.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Account identifier - unique, caller-chosen string.
pub type AccountId = String;

/// The persisted account record, including the stored credential.
/// Internal to the crate; callers see [`Account`] instead.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoredAccount {
    pub id: AccountId,
    pub password_hash: String,
    pub created: DateTime<Utc>,
    pub password_changed: DateTime<Utc>,
    pub locked: bool,
    pub lockable: bool,
    pub max_attempts: u32,
    pub failed_logins: u32,
    pub frozen_at: Option<DateTime<Utc>>,
    /// Active freeze window in milliseconds; 0 when not escalating.
    pub current_freeze_time: i64,
    /// Base freeze window in milliseconds used to seed a new backoff chain.
    pub freeze_time: i64,
    pub data: Value,
}

/// Public view of an account. Never carries the stored credential.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Account {
    pub id: AccountId,
    pub created: DateTime<Utc>,
    pub password_changed: DateTime<Utc>,
    pub locked: bool,
    pub lockable: bool,
    pub max_attempts: u32,
    pub failed_logins: u32,
    pub frozen_at: Option<DateTime<Utc>>,
    pub current_freeze_time: i64,
    pub freeze_time: i64,
    pub data: Value,
}

impl From<StoredAccount> for Account {
    fn from(record: StoredAccount) -> Self {
        Self {
            id: record.id,
            created: record.created,
            password_changed: record.password_changed,
            locked: record.locked,
            lockable: record.lockable,
            max_attempts: record.max_attempts,
            failed_logins: record.failed_logins,
            frozen_at: record.frozen_at,
            current_freeze_time: record.current_freeze_time,
            freeze_time: record.freeze_time,
            data: record.data,
        }
    }
}

/// Fields accepted when creating an account. Everything except `id` and
/// `password` is optional; unset thresholds fall back to the configured
/// defaults, `locked` to false and `lockable` to true.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub id: AccountId,
    pub password: String,
    pub locked: Option<bool>,
    pub lockable: Option<bool>,
    pub max_attempts: Option<u32>,
    pub freeze_time: Option<i64>,
}

impl NewAccount {
    pub fn new(id: impl Into<AccountId>, password: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn freeze_time(mut self, freeze_time: i64) -> Self {
        self.freeze_time = Some(freeze_time);
        self
    }

    pub fn lockable(mut self, lockable: bool) -> Self {
        self.lockable = Some(lockable);
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }
}

/// A partial update applied to a stored record. Unset fields are left
/// untouched; `frozen_at` is doubly optional so the patch can clear it.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub password_hash: Option<String>,
    pub password_changed: Option<DateTime<Utc>>,
    pub locked: Option<bool>,
    pub lockable: Option<bool>,
    pub failed_logins: Option<u32>,
    pub frozen_at: Option<Option<DateTime<Utc>>>,
    pub current_freeze_time: Option<i64>,
    pub data: Option<Value>,
}

impl AccountPatch {
    pub fn apply(&self, record: &mut StoredAccount) {
        if let Some(hash) = &self.password_hash {
            record.password_hash = hash.clone();
        }
        if let Some(ts) = self.password_changed {
            record.password_changed = ts;
        }
        if let Some(locked) = self.locked {
            record.locked = locked;
        }
        if let Some(lockable) = self.lockable {
            record.lockable = lockable;
        }
        if let Some(n) = self.failed_logins {
            record.failed_logins = n;
        }
        if let Some(frozen_at) = self.frozen_at {
            record.frozen_at = frozen_at;
        }
        if let Some(ms) = self.current_freeze_time {
            record.current_freeze_time = ms;
        }
        if let Some(data) = &self.data {
            record.data = data.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Created,
    PasswordChanged,
    Locked,
    Lockable,
    MaxAttempts,
    FailedLogins,
    FrozenAt,
    CurrentFreezeTime,
    FreezeTime,
}

impl SortField {
    pub(crate) fn compare(self, a: &StoredAccount, b: &StoredAccount) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Created => a.created.cmp(&b.created),
            SortField::PasswordChanged => a.password_changed.cmp(&b.password_changed),
            SortField::Locked => a.locked.cmp(&b.locked),
            SortField::Lockable => a.lockable.cmp(&b.lockable),
            SortField::MaxAttempts => a.max_attempts.cmp(&b.max_attempts),
            SortField::FailedLogins => a.failed_logins.cmp(&b.failed_logins),
            // `None` sorts before any timestamp, ascending.
            SortField::FrozenAt => a.frozen_at.cmp(&b.frozen_at),
            SortField::CurrentFreezeTime => a.current_freeze_time.cmp(&b.current_freeze_time),
            SortField::FreezeTime => a.freeze_time.cmp(&b.freeze_time),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One sort key; descending booleans put `true` first.
#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }
}

impl From<SortField> for SortKey {
    fn from(field: SortField) -> Self {
        SortKey::asc(field)
    }
}

/// Pagination and ordering for [`list`](crate::account::AccountManager::list).
/// The default orders by creation time, ascending, from offset 0 with no limit.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub offset: usize,
    pub limit: Option<usize>,
    pub order_by: Vec<SortKey>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order_by(mut self, key: impl Into<SortKey>) -> Self {
        self.order_by.push(key.into());
        self
    }
}
