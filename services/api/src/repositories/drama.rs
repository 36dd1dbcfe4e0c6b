//! Drama repository for database operations

use async_trait::async_trait;
use common::error::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Drama;
use crate::resolver::DramaStore;

/// Drama repository for database operations
#[derive(Clone)]
pub struct DramaRepository {
    pool: PgPool,
}

impl DramaRepository {
    /// Create a new drama repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get all dramas ordered by title
    pub async fn get_all(&self) -> DatabaseResult<Vec<Drama>> {
        let dramas = sqlx::query_as::<_, Drama>(
            r#"
            SELECT id, title, description, created_at
            FROM dramas
            ORDER BY title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(dramas)
    }

    /// Get a drama by ID
    pub async fn get_by_id(&self, id: Uuid) -> DatabaseResult<Option<Drama>> {
        let drama = sqlx::query_as::<_, Drama>(
            r#"
            SELECT id, title, description, created_at
            FROM dramas
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(drama)
    }
}

#[async_trait]
impl DramaStore for DramaRepository {
    async fn find_id_by_title(&self, title: &str) -> DatabaseResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM dramas
            WHERE title = $1
            "#,
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    async fn insert_if_absent(&self, title: &str) -> DatabaseResult<Option<Uuid>> {
        // A conflicting row yields no RETURNING row instead of an error
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO dramas (title)
            VALUES ($1)
            ON CONFLICT ON CONSTRAINT uq_dramas_title DO NOTHING
            RETURNING id
            "#,
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }
}
