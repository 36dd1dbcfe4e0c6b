//! Drama model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A drama, identified by its exact title
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Drama {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
