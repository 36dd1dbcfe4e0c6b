//! Custom error types for the API service
//!
//! Every failure a handler can hit is converted into [`ApiError`], which is
//! the only place HTTP status codes are chosen.

use auth::{AccountError, AuthError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::repositories::QuoteError;
use crate::resolver::ResolveError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, invalid or expired token, or bad credentials
    #[error("{0}")]
    Unauthorized(AuthError),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many failed login attempts")]
    TooManyRequests,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err)
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(msg) => ApiError::BadRequest(msg),
            AccountError::Conflict(msg) => ApiError::Conflict(msg),
            AccountError::Auth(e) => ApiError::Unauthorized(e),
            AccountError::TooManyAttempts => ApiError::TooManyRequests,
            AccountError::Persistence(e) => ApiError::Database(e),
            AccountError::Internal(msg) => {
                error!("Account operation failed: {}", msg);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::EmptyTitle | ResolveError::TitleTooLong => {
                ApiError::BadRequest(err.to_string())
            }
            ResolveError::Unresolved(_) => {
                error!("{}", err);
                ApiError::InternalServerError
            }
            ResolveError::Store(e) => ApiError::Database(e),
        }
    }
}

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::Validation(msg) => ApiError::BadRequest(msg),
            QuoteError::AuthorRequired => ApiError::Unauthorized(AuthError::TokenMissing),
            QuoteError::InvalidReference => ApiError::Conflict(err.to_string()),
            QuoteError::UnknownAuthor => ApiError::Unauthorized(AuthError::TokenInvalid),
            QuoteError::Persistence(e) => ApiError::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many failed login attempts, try again later".to_string(),
            ),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
