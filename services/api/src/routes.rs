//! API service routes

use auth::models::{LoginCredentials, Registration};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware, optional_auth_middleware},
    models::{AuthResponse, CreateQuoteRequest, Quote},
    repositories::NewQuote,
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Only submission looks at the token; listing stays public
    let quote_routes = get(get_quotes).merge(post(create_quote).route_layer(
        middleware::from_fn_with_state(state.clone(), optional_auth_middleware),
    ));

    Router::new()
        .route("/", get(index))
        .route("/test", get(status_report))
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/quotes", quote_routes)
        .route("/quotes/:id", get(get_quote))
        .route("/dramas", get(get_dramas))
        .route("/dramas/:id", get(get_drama))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Service index
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "K-Drama Quotes API",
        "endpoints": [
            "GET /health",
            "GET /test",
            "POST /register",
            "POST /login",
            "GET /me",
            "GET /quotes",
            "GET /quotes/:id",
            "POST /quotes",
            "GET /dramas",
            "GET /dramas/:id"
        ]
    }))
}

/// Liveness report with the endpoint map, kept for existing clients of `/test`
pub async fn status_report() -> impl IntoResponse {
    Json(json!({
        "message": "K-Drama Quotes API is running",
        "status": "ok",
        "timestamp": Utc::now(),
        "endpoints": {
            "auth": ["/register", "/login", "/me"],
            "quotes": "/quotes",
            "dramas": "/dramas",
            "health": "/health",
            "test": "/test"
        }
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool).await;
    let signing_key = if state.accounts.tokens().uses_fallback_key() {
        "fallback"
    } else {
        "configured"
    };

    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "kdrama-quotes-api",
            "database": database,
            "signing_key": signing_key
        })),
    )
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Registration>,
) -> ApiResult<impl IntoResponse> {
    let session = state.accounts.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            session,
        }),
    ))
}

/// Log in with a username (or email) and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> ApiResult<impl IntoResponse> {
    let session = state.accounts.login(payload).await?;

    Ok(Json(AuthResponse {
        message: "Login successful",
        session,
    }))
}

/// Identity carried by the caller's token
pub async fn current_user(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    Json(user)
}

/// Get all quotes, newest first
pub async fn get_quotes(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let quotes = state.quote_repository.get_all().await?;

    Ok(Json(quotes))
}

/// Get a quote by ID
pub async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let quote = state
        .quote_repository
        .get_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Quote not found".to_string()))?;

    Ok(Json(quote))
}

/// Submit a quote, creating its drama on first mention
pub async fn create_quote(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<CreateQuoteRequest>,
) -> ApiResult<impl IntoResponse> {
    let author = user.map(|Extension(user)| user);

    // Detached so a dropped connection cannot cancel the write midway
    let quote = tokio::spawn(submit_quote(state, author, payload))
        .await
        .map_err(|e| {
            error!("Quote submission task failed: {}", e);
            ApiError::InternalServerError
        })??;

    Ok((StatusCode::CREATED, Json(quote)))
}

async fn submit_quote(
    state: AppState,
    author: Option<AuthUser>,
    payload: CreateQuoteRequest,
) -> ApiResult<Quote> {
    let author_id = author.as_ref().map(|user| user.id);

    state.quote_repository.validate_submission(
        &payload.text,
        &payload.character_name,
        payload.season,
        payload.episode,
        author_id,
    )?;

    let drama_id = state.resolver.resolve(&payload.drama_title).await?;

    let quote = state
        .quote_repository
        .create(&NewQuote {
            text: payload.text,
            drama_id,
            character_name: payload.character_name,
            season: payload.season,
            episode: payload.episode,
            author_id,
        })
        .await?;

    match &author {
        Some(user) => info!(quote_id = %quote.id, %drama_id, "Quote submitted by {}", user.username),
        None => info!(quote_id = %quote.id, %drama_id, "Anonymous quote submitted"),
    }

    Ok(quote)
}

/// Get all dramas ordered by title
pub async fn get_dramas(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let dramas = state.drama_repository.get_all().await?;

    Ok(Json(dramas))
}

/// Get a drama by ID
pub async fn get_drama(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let drama = state
        .drama_repository
        .get_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Drama not found".to_string()))?;

    Ok(Json(drama))
}
