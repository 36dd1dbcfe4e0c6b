//! API models for request and response payloads

use auth::Session;
use serde::Serialize;

pub mod drama;
pub mod quote;

pub use drama::Drama;
pub use quote::{CreateQuoteRequest, Quote};

/// Response for a successful registration or login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub session: Session,
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::models::PublicUser;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn auth_response_flattens_the_session() {
        let response = AuthResponse {
            message: "User registered successfully",
            session: Session {
                user: PublicUser {
                    id: Uuid::nil(),
                    username: "jiwoo".to_string(),
                    email: "jiwoo@example.com".to_string(),
                },
                token: "t0k3n".to_string(),
                token_type: "Bearer",
                expires_at: Utc::now(),
            },
        };

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["token"], "t0k3n");
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["user"]["username"], "jiwoo");
        assert!(body["user"].get("password_hash").is_none());
        assert!(body.get("session").is_none());
    }
}
