//! Identity layer for the K-Drama Quotes API
//!
//! - [`password`]: argon2id hashing and verification of user passwords.
//! - [`jwt`]: stateless, signed, time-bounded session tokens.
//! - [`service`]: registration and login built on the two above.
//! - [`rate_limiter`]: failed-login throttling.

pub mod error;
pub mod jwt;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod service;
pub mod validation;

pub use error::{AccountError, AuthError, CredentialError};
pub use jwt::{Identity, TokenConfig, TokenService};
pub use password::{CredentialManager, PasswordPolicy};
pub use service::{AccountService, Session};
