//! Error types for credential handling, token verification and account flows

use common::error::DatabaseError;
use thiserror::Error;

/// Failures of the password hashing primitives
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The password does not satisfy the configured policy
    #[error("Invalid password: {0}")]
    InvalidInput(String),

    /// A stored hash could not be parsed
    #[error("Stored credential is malformed")]
    CorruptCredential,

    /// The hasher itself failed (bad parameters, worker pool shut down)
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Reasons a caller could not be authenticated.
///
/// The `Display` strings are what clients see, so they never say which part
/// of a login was wrong.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Missing bearer token")]
    TokenMissing,

    #[error("Invalid or expired token")]
    TokenInvalid,

    #[error("Invalid or expired token")]
    TokenExpired,
}

/// Failures of the register and login flows
#[derive(Error, Debug)]
pub enum AccountError {
    /// Caller supplied missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Username or email already registered
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Login temporarily blocked after repeated failures
    #[error("Too many failed login attempts, try again later")]
    TooManyAttempts,

    #[error(transparent)]
    Persistence(#[from] DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}
