use thiserror::Error;

use crate::account::store::StoreError;
use crate::strategy::StrategyError;

#[derive(Error, Debug)]
pub enum WardenError {
    #[error("unknown account: {0}")]
    UnknownAccount(String),
    #[error("duplicate account id: {0}")]
    DuplicateId(String),
    #[error("account not lockable: {0}")]
    NotLockable(String),
    #[error("account locked: {0}")]
    AccountLocked(String),
    #[error("account frozen: {0}")]
    AccountFrozen(String),
    #[error("password rejected")]
    PasswordRejected,
    #[error("store error: {0}")]
    Store(StoreError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

impl From<StoreError> for WardenError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => WardenError::UnknownAccount(id),
            StoreError::Duplicate(id) => WardenError::DuplicateId(id),
            other => WardenError::Store(other),
        }
    }
}
