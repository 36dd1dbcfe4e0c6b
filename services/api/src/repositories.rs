//! Repositories for database operations

pub mod drama;
pub mod quote;

pub use drama::DramaRepository;
pub use quote::{NewQuote, QuoteError, QuoteRepository};
