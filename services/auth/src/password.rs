//! Argon2id password hashing and verification.
//!
//! Every hash gets a fresh random salt and is stored in PHC string format, so
//! the algorithm parameters travel with the hash and old hashes keep
//! verifying after the work factor is raised.

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::sync::Arc;

use crate::error::CredentialError;

/// Minimum password length accepted when none is configured
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// Upper bound on password length, keeps hashing cost bounded
pub const MAX_PASSWORD_LENGTH: usize = 128;

const DECOY_PASSWORD: &str = "decoy-password-never-issued";

/// Password policy and argon2 work factor
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Minimum number of characters
    pub min_length: usize,
    /// Argon2 memory cost in KiB
    pub memory_kib: u32,
    /// Argon2 iteration count
    pub iterations: u32,
    /// Argon2 lanes
    pub parallelism: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_PASSWORD_LENGTH,
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Hashes and verifies user passwords
#[derive(Clone)]
pub struct CredentialManager {
    argon2: Argon2<'static>,
    min_length: usize,
    /// Hash with the live work factor, verified against when no user matches
    decoy_hash: Arc<str>,
}

impl CredentialManager {
    /// Build a manager for the given policy
    pub fn new(policy: PasswordPolicy) -> Result<Self, CredentialError> {
        let params = Params::new(policy.memory_kib, policy.iterations, policy.parallelism, None)
            .map_err(|e| CredentialError::Hashing(format!("invalid argon2 parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut rand::thread_rng());
        let decoy_hash = argon2
            .hash_password(DECOY_PASSWORD.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
            .to_string();

        Ok(Self {
            argon2,
            min_length: policy.min_length.max(1),
            decoy_hash: decoy_hash.into(),
        })
    }

    /// Minimum accepted password length
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Check a candidate password against the length policy
    pub fn check_policy(&self, password: &str) -> Result<(), CredentialError> {
        if password.is_empty() {
            return Err(CredentialError::InvalidInput(
                "Password is required".to_string(),
            ));
        }

        let length = password.chars().count();
        if length < self.min_length {
            return Err(CredentialError::InvalidInput(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if length > MAX_PASSWORD_LENGTH {
            return Err(CredentialError::InvalidInput(format!(
                "Password must be at most {} characters long",
                MAX_PASSWORD_LENGTH
            )));
        }

        Ok(())
    }

    /// Hash a password with a random salt, returning the PHC string
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        self.check_policy(password)?;

        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored PHC hash.
    ///
    /// A mismatch is `Ok(false)`; only an unparseable hash is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(hash).map_err(|_| CredentialError::CorruptCredential)?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(_) => Err(CredentialError::CorruptCredential),
        }
    }

    /// Spend the same work as a real [`verify_async`](Self::verify_async)
    /// without a stored hash, so unknown logins cost as much as wrong
    /// passwords.
    pub async fn verify_decoy_async(&self, password: String) {
        // The outcome is irrelevant, only the elapsed time matters
        let _ = self
            .verify_async(password, self.decoy_hash.to_string())
            .await;
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn hash_async(&self, password: String) -> Result<String, CredentialError> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.hash(&password))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking pool
    pub async fn verify_async(&self, password: String, hash: String) -> Result<bool, CredentialError> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.verify(&password, &hash))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
    }
}

#[cfg(test)]
pub(crate) fn test_manager() -> CredentialManager {
    CredentialManager::new(PasswordPolicy {
        min_length: DEFAULT_MIN_PASSWORD_LENGTH,
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("test policy is valid")
}
