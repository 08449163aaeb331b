//! Account credential management.
//!
//! This module implements the account state machine:
//! - Lifecycle: create, remove, rename, password change
//! - Administrative lock/unlock with a per-account lockable flag
//! - Exponential-backoff freezing on repeated failed logins
//! - The ordered authentication decision procedure
//! - Path-addressed metadata on each account

pub mod auth;
pub mod data;
pub mod freeze;
pub mod lock;
pub mod manager;
pub mod store;
pub mod types;

pub use manager::AccountManager;
pub use store::{AccountStore, MemoryStore, StoreError};
pub use types::{
    Account, AccountId, AccountPatch, ListOptions, NewAccount, SortDirection, SortField, SortKey,
    StoredAccount,
};
