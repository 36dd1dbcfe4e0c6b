//! JWT service for session token issuance and verification
//!
//! Session tokens are HS256-signed JWTs carrying the user id and username.
//! They are stateless: verification checks the signature and the expiry and
//! never touches the database. There is no revocation, a token stays valid
//! until its `exp`.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::AuthError;

/// Default session lifetime in hours
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Key used when no signing key is configured. Anyone who reads this source
/// can forge tokens for a deployment running on it.
const FALLBACK_SIGNING_KEY: &str = "kdrama-quotes-development-signing-key";

/// Token signing configuration
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    /// Lifetime of issued tokens
    pub ttl: Duration,
    fallback: bool,
}

impl TokenConfig {
    /// Build the configuration from an optional signing key and a lifetime.
    ///
    /// A missing or blank key selects the built-in fallback key; a
    /// non-positive lifetime selects [`DEFAULT_TOKEN_TTL_HOURS`].
    pub fn new(secret: Option<String>, ttl_hours: i64) -> Self {
        let ttl_hours = if ttl_hours > 0 {
            ttl_hours
        } else {
            DEFAULT_TOKEN_TTL_HOURS
        };

        match secret.filter(|s| !s.trim().is_empty()) {
            Some(secret) => Self {
                secret,
                ttl: Duration::hours(ttl_hours),
                fallback: false,
            },
            None => Self {
                secret: FALLBACK_SIGNING_KEY.to_string(),
                ttl: Duration::hours(ttl_hours),
                fallback: true,
            },
        }
    }

    /// Whether the built-in fallback key is in use
    pub fn uses_fallback_key(&self) -> bool {
        self.fallback
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Username at issuance
    pub username: String,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Identity asserted by a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

/// A freshly signed token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    fallback: bool,
}

impl TokenService {
    /// Initialize a new token service
    pub fn new(config: TokenConfig) -> Self {
        if config.uses_fallback_key() {
            warn!(
                "No JWT signing key configured, using the built-in fallback key. \
                 Set QUOTES_JWT_SECRET before exposing this service."
            );
        }

        // Expiry is checked by `verify_at` without leeway
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        TokenService {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: config.ttl,
            fallback: config.fallback,
        }
    }

    /// Issue a token for a user, valid for the configured lifetime
    pub fn issue(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        self.issue_at(user_id, username, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        user_id: Uuid,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a presented token and return the identity it carries
    pub fn verify(&self, token: Option<&str>) -> Result<Identity, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a presented token as if the current time were `now`.
    ///
    /// A token is expired at and after its `exp` instant.
    pub fn verify_at(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::TokenMissing)?;

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::TokenInvalid)?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Ok(Identity {
            user_id: claims.sub,
            username: claims.username,
        })
    }

    /// Lifetime of issued tokens
    pub fn token_ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether tokens are signed with the built-in fallback key
    pub fn uses_fallback_key(&self) -> bool {
        self.fallback
    }
}
