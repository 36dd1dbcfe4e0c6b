//! Account models

pub mod user;

// Re-export for convenience
pub use user::{LoginCredentials, NewUser, PublicUser, Registration, User};
