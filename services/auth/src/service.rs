//! Registration and login flows
//!
//! Composes the user repository, the credential manager, the token service
//! and the failed-login limiter. Every successful flow ends with a freshly
//! issued session token.

use chrono::{DateTime, Utc};
use common::error::DatabaseError;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{AccountError, AuthError, CredentialError};
use crate::jwt::TokenService;
use crate::models::{LoginCredentials, NewUser, PublicUser, Registration, User};
use crate::password::CredentialManager;
use crate::rate_limiter::RateLimiter;
use crate::repositories::UserRepository;
use crate::repositories::user::{EMAIL_CONSTRAINT, USERNAME_CONSTRAINT};
use crate::validation::{validate_email, validate_username};

/// An authenticated session handed back to the client
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: PublicUser,
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// Account operations
#[derive(Clone)]
pub struct AccountService {
    users: UserRepository,
    credentials: CredentialManager,
    tokens: TokenService,
    rate_limiter: RateLimiter,
}

impl AccountService {
    pub fn new(
        users: UserRepository,
        credentials: CredentialManager,
        tokens: TokenService,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            users,
            credentials,
            tokens,
            rate_limiter,
        }
    }

    /// The token service used to sign sessions
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new user and open a session for them
    pub async fn register(&self, registration: Registration) -> Result<Session, AccountError> {
        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_string();

        validate_username(&username).map_err(AccountError::Validation)?;
        validate_email(&email).map_err(AccountError::Validation)?;

        let password_hash = self
            .credentials
            .hash_async(registration.password)
            .await
            .map_err(credential_failure)?;

        let user = self
            .users
            .create(&NewUser {
                username,
                email,
                password_hash,
            })
            .await
            .map_err(registration_conflict)?;

        info!(user_id = %user.id, "Registered user {}", user.username);
        self.open_session(&user)
    }

    /// Check a username (or email) and password and open a session
    pub async fn login(&self, credentials: LoginCredentials) -> Result<Session, AccountError> {
        let login = credentials.username.trim();
        if login.is_empty() || credentials.password.is_empty() {
            return Err(AccountError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let name_key = login_key(login);
        if !self.rate_limiter.is_allowed(&name_key).await {
            warn!("Rejected login for {}: too many failed attempts", login);
            return Err(AccountError::TooManyAttempts);
        }

        let Some(user) = self.users.find_by_username_or_email(login).await? else {
            // Unknown logins pay for a hash too, so timing does not reveal accounts
            self.credentials
                .verify_decoy_async(credentials.password)
                .await;
            self.rate_limiter.record_failure(&name_key).await;
            return Err(AuthError::InvalidCredentials.into());
        };

        // Username and email logins share one bucket per account
        let account_key = account_key(&user);
        if !self.rate_limiter.is_allowed(&account_key).await {
            warn!(user_id = %user.id, "Rejected login for {}: too many failed attempts", user.username);
            return Err(AccountError::TooManyAttempts);
        }

        let valid = self
            .credentials
            .verify_async(credentials.password, user.password_hash.clone())
            .await
            .map_err(|e| {
                error!(user_id = %user.id, "Unable to verify stored password hash: {}", e);
                AccountError::Internal("password verification failed".to_string())
            })?;

        if !valid {
            self.rate_limiter.record_failure(&account_key).await;
            return Err(AuthError::InvalidCredentials.into());
        }

        self.rate_limiter.reset(&account_key).await;
        self.rate_limiter.reset(&name_key).await;
        info!(user_id = %user.id, "User {} logged in", user.username);
        self.open_session(&user)
    }

    fn open_session(&self, user: &User) -> Result<Session, AccountError> {
        let issued = self
            .tokens
            .issue(user.id, &user.username)
            .map_err(|e| AccountError::Internal(format!("failed to sign session token: {}", e)))?;

        Ok(Session {
            user: PublicUser::from(user),
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
        })
    }
}

/// Failed-login bucket for a name that matched no account
fn login_key(login: &str) -> String {
    format!("login:{}", login.trim().to_lowercase())
}

/// Failed-login bucket for an existing account
fn account_key(user: &User) -> String {
    format!("user:{}", user.id)
}

fn registration_conflict(err: DatabaseError) -> AccountError {
    if err.is_unique_violation_on(USERNAME_CONSTRAINT) {
        AccountError::Conflict("Username is already taken".to_string())
    } else if err.is_unique_violation_on(EMAIL_CONSTRAINT) {
        AccountError::Conflict("Email is already registered".to_string())
    } else if let DatabaseError::UniqueViolation { .. } = err {
        AccountError::Conflict("A user with that username or email already exists".to_string())
    } else {
        AccountError::Persistence(err)
    }
}

fn credential_failure(err: CredentialError) -> AccountError {
    match err {
        CredentialError::InvalidInput(msg) => AccountError::Validation(msg),
        other => AccountError::Internal(other.to_string()),
    }
}
