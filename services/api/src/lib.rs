//! K-Drama Quotes HTTP API
//!
//! Users register and log in through [`auth`], then submit quotes that name
//! their drama by title. Titles are resolved to drama rows by
//! [`resolver::EntityResolver`]; quotes are stored and read back joined with
//! their drama and author by [`repositories::QuoteRepository`].

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod resolver;
pub mod routes;
pub mod state;

pub use state::AppState;
