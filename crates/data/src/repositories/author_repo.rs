//! Author registry repository.

use anyhow::Result;
use sqlx::PgPool;

use crate::models::AuthorRecord;

/// Repository for the author registry.
#[derive(Debug, Clone)]
pub struct AuthorRepository {
    pool: PgPool,
}

impl AuthorRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers an author, updating name and context if the platform
    /// account is already known. Returns the stored ID.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn upsert(&self, record: &AuthorRecord) -> Result<String> {
        let row: (String,) = sqlx::query_as(
            r#"
            INSERT INTO authors (id, platform, platform_id, name, author_context, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (platform, platform_id) DO UPDATE
                SET name = EXCLUDED.name,
                    author_context = EXCLUDED.author_context
            RETURNING id
            "#,
        )
        .bind(&record.id)
        .bind(&record.platform)
        .bind(&record.platform_id)
        .bind(&record.name)
        .bind(&record.author_context)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Lists the authors subscribed on one platform, oldest first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn list_by_platform(&self, platform: &str) -> Result<Vec<AuthorRecord>> {
        let records = sqlx::query_as::<_, AuthorRecord>(
            r#"
            SELECT id, platform, platform_id, name, author_context, created_at
            FROM authors
            WHERE platform = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(platform)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Gets an author by ID.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: &str) -> Result<Option<AuthorRecord>> {
        let record = sqlx::query_as::<_, AuthorRecord>(
            "SELECT id, platform, platform_id, name, author_context, created_at FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
