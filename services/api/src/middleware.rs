//! Bearer token authentication middleware

use auth::{AuthError, Identity};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

impl From<Identity> for AuthUser {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.user_id,
            username: identity.username,
        }
    }
}

type BearerHeader = Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>;

/// The presented bearer token, `None` when no Authorization header was sent.
///
/// A header that is present but not a well-formed bearer credential is
/// treated as an invalid token, never as an absent one.
fn presented_token(header: &BearerHeader) -> Result<Option<&str>, AuthError> {
    match header {
        Ok(TypedHeader(authorization)) => Ok(Some(authorization.token())),
        Err(rejection) if rejection.is_missing() => Ok(None),
        Err(_) => Err(AuthError::TokenInvalid),
    }
}

/// Require a valid bearer token
pub async fn auth_middleware(
    State(state): State<AppState>,
    header: BearerHeader,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = presented_token(&header)?;
    let identity = state.accounts.tokens().verify(token).map_err(|e| {
        debug!("Rejected request to {}: {}", req.uri().path(), e);
        e
    })?;

    req.extensions_mut().insert(AuthUser::from(identity));

    Ok(next.run(req).await)
}

/// Attach the caller's identity when a token is presented.
///
/// Requests without an Authorization header pass through anonymously; a
/// presented token must still verify.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    header: BearerHeader,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = presented_token(&header)? {
        let identity = state.accounts.tokens().verify(Some(token))?;
        req.extensions_mut().insert(AuthUser::from(identity));
    }

    Ok(next.run(req).await)
}
