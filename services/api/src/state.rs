//! Application state shared across handlers

use auth::rate_limiter::RateLimiter;
use auth::repositories::UserRepository;
use auth::{AccountService, CredentialError, CredentialManager, TokenService};
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::repositories::{DramaRepository, QuoteRepository};
use crate::resolver::EntityResolver;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub accounts: AccountService,
    pub resolver: EntityResolver<DramaRepository>,
    pub drama_repository: DramaRepository,
    pub quote_repository: QuoteRepository,
}

impl AppState {
    /// Wire the services over a connection pool
    pub fn new(pool: PgPool, config: &AppConfig) -> Result<Self, CredentialError> {
        let credentials = CredentialManager::new(config.password_policy())?;
        let tokens = TokenService::new(config.token_config());
        let accounts = AccountService::new(
            UserRepository::new(pool.clone()),
            credentials,
            tokens,
            RateLimiter::new(config.rate_limiter_config()),
        );

        let drama_repository = DramaRepository::new(pool.clone());

        Ok(Self {
            accounts,
            resolver: EntityResolver::new(drama_repository.clone()),
            drama_repository,
            quote_repository: QuoteRepository::new(pool.clone(), config.allow_anonymous_quotes),
            db_pool: pool,
        })
    }
}
