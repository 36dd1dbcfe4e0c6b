//! Quote models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A quote joined with its drama and, when present, its author
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quote {
    pub id: Uuid,
    pub text: String,
    pub drama_id: Uuid,
    pub drama_title: String,
    pub drama_description: Option<String>,
    pub character_name: String,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub author_id: Option<Uuid>,
    pub author_username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for quote submission.
///
/// The drama is named by title and resolved (or created) server side; the
/// author always comes from the bearer token, never from the body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuoteRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub drama_title: String,
    #[serde(default)]
    pub character_name: String,
    pub season: Option<i32>,
    pub episode: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_blank() {
        let request: CreateQuoteRequest =
            serde_json::from_str(r#"{"text": "Saranghae"}"#).unwrap();

        assert_eq!(request.text, "Saranghae");
        assert!(request.drama_title.is_empty());
        assert!(request.character_name.is_empty());
        assert_eq!(request.season, None);
    }

    #[test]
    fn body_author_is_ignored() {
        let request: CreateQuoteRequest = serde_json::from_str(
            r#"{"text": "t", "drama_title": "d", "character_name": "c", "user_id": 7}"#,
        )
        .unwrap();

        assert_eq!(request.drama_title, "d");
    }
}
