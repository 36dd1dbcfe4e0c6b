//! Application configuration
//!
//! Defaults overlaid by `QUOTES_*` environment variables, e.g.
//! `QUOTES_PORT=9000` or `QUOTES_ALLOW_ANONYMOUS_QUOTES=true`. Database
//! settings are read separately by [`common::database::DatabaseConfig`].

use auth::jwt::DEFAULT_TOKEN_TTL_HOURS;
use auth::password::DEFAULT_MIN_PASSWORD_LENGTH;
use auth::rate_limiter::RateLimiterConfig;
use auth::{PasswordPolicy, TokenConfig};
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Prefix of the environment variables read by [`AppConfig::load`]
pub const ENV_PREFIX: &str = "QUOTES";

/// Process-wide configuration, loaded once at start-up
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Token signing key; unset means the built-in fallback key
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,
    pub min_password_length: usize,
    pub password_memory_kib: u32,
    pub password_iterations: u32,
    /// Accept quotes without an authenticated author
    pub allow_anonymous_quotes: bool,
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    pub login_ban_seconds: u64,
}

impl AppConfig {
    /// Load the configuration from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_source(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load the configuration from an explicit environment source
    pub fn from_source(environment: Environment) -> Result<Self, ConfigError> {
        let password_defaults = PasswordPolicy::default();
        let login_defaults = RateLimiterConfig::default();

        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080_i64)?
            .set_default("token_ttl_hours", DEFAULT_TOKEN_TTL_HOURS)?
            .set_default("min_password_length", DEFAULT_MIN_PASSWORD_LENGTH as i64)?
            .set_default("password_memory_kib", password_defaults.memory_kib as i64)?
            .set_default("password_iterations", password_defaults.iterations as i64)?
            .set_default("allow_anonymous_quotes", false)?
            .set_default("login_max_attempts", login_defaults.max_attempts as i64)?
            .set_default("login_window_seconds", login_defaults.window_seconds as i64)?
            .set_default("login_ban_seconds", login_defaults.ban_duration_seconds as i64)?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::new(self.jwt_secret.clone(), self.token_ttl_hours)
    }

    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy {
            min_length: self.min_password_length,
            memory_kib: self.password_memory_kib,
            iterations: self.password_iterations,
            ..PasswordPolicy::default()
        }
    }

    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_attempts: self.login_max_attempts,
            window_seconds: self.login_window_seconds,
            ban_duration_seconds: self.login_ban_seconds,
            ..RateLimiterConfig::default()
        }
    }
}
