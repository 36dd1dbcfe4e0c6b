//! Shared helpers for the HTTP integration tests

#![allow(dead_code)]

use api::config::{AppConfig, ENV_PREFIX};
use api::routes;
use api::state::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use config::Environment;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Configuration with a cheap argon2 work factor and a fixed signing key
pub fn test_config(allow_anonymous_quotes: bool) -> AppConfig {
    let mut vars = config::Map::new();
    vars.insert("QUOTES_JWT_SECRET".to_string(), "integration-test-secret".to_string());
    vars.insert("QUOTES_PASSWORD_MEMORY_KIB".to_string(), "1024".to_string());
    vars.insert("QUOTES_PASSWORD_ITERATIONS".to_string(), "1".to_string());
    vars.insert(
        "QUOTES_ALLOW_ANONYMOUS_QUOTES".to_string(),
        allow_anonymous_quotes.to_string(),
    );

    AppConfig::from_source(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
        .expect("test configuration should load")
}

/// Build the full application router over `pool`
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, false)
}

pub fn build_test_app_with(pool: PgPool, allow_anonymous_quotes: bool) -> Router {
    let state = AppState::new(pool, &test_config(allow_anonymous_quotes))
        .expect("test state should build");
    routes::create_router(state)
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Register a user through the API and return its bearer token
pub async fn register_user(app: Router, username: &str, password: &str) -> String {
    let body = serde_json::json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": password,
    });
    let response = post_json(app, "/register", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["token"]
        .as_str()
        .expect("register returns a token")
        .to_string()
}
