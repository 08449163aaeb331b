//! Pluggable password hashing and comparison strategies.
//!
//! The manager is constructed with one hasher and one checker; closures with
//! the matching signatures work directly through the blanket impls. The
//! defaults ([`Identity`] and [`Equality`]) store and compare plaintext and
//! exist for development and tests only.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Turns a plaintext password into the stored credential string.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, StrategyError>;
}

/// Compares a supplied password against the stored credential string.
pub trait PasswordChecker: Send + Sync {
    fn check(&self, supplied: &str, stored: &str) -> bool;
}

impl<F> PasswordHasher for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn hash(&self, plaintext: &str) -> Result<String, StrategyError> {
        Ok(self(plaintext))
    }
}

impl<F> PasswordChecker for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn check(&self, supplied: &str, stored: &str) -> bool {
        self(supplied, stored)
    }
}

/// Stores the plaintext unchanged. Not for production use.
pub struct Identity;

impl PasswordHasher for Identity {
    fn hash(&self, plaintext: &str) -> Result<String, StrategyError> {
        Ok(plaintext.to_string())
    }
}

/// Plain string equality against the stored credential. Not for production use.
pub struct Equality;

impl PasswordChecker for Equality {
    fn check(&self, supplied: &str, stored: &str) -> bool {
        supplied == stored
    }
}

/// Unsalted SHA-256 digest, hex-encoded.
pub struct Sha256Digest;

impl PasswordHasher for Sha256Digest {
    fn hash(&self, plaintext: &str) -> Result<String, StrategyError> {
        let mut hasher = Sha256::new();
        hasher.update(plaintext.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

impl PasswordChecker for Sha256Digest {
    fn check(&self, supplied: &str, stored: &str) -> bool {
        match self.hash(supplied) {
            Ok(digest) => digest == stored,
            Err(_) => false,
        }
    }
}

/// Argon2id with a random per-password salt, PHC string encoded.
pub struct Argon2id;

impl PasswordHasher for Argon2id {
    fn hash(&self, plaintext: &str) -> Result<String, StrategyError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StrategyError::Hash(e.to_string()))
    }
}

impl PasswordChecker for Argon2id {
    fn check(&self, supplied: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(supplied.as_bytes(), &parsed)
            .is_ok()
    }
}
