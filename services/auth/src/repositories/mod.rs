//! Repositories for account storage

pub mod user;

pub use user::UserRepository;
