//! Tweet process repository.
//!
//! Status transitions are guarded on `status = 'submitted'` so a run moves
//! to a terminal state at most once.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::models::{TweetProcessRecord, TweetProcessStatus};

/// Outcome of a guarded status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The row was in `submitted` and has been updated.
    Applied,
    /// No row with that ID exists.
    NotFound,
    /// The row had already left `submitted`.
    AlreadyTerminal(TweetProcessStatus),
}

/// Repository for tweet process operations.
#[derive(Debug, Clone)]
pub struct TweetProcessRepository {
    pool: PgPool,
}

impl TweetProcessRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a submitted run and returns the generated ID.
    ///
    /// # Errors
    /// Returns an error if the database operation fails, including a
    /// duplicate `tweet_process_id`.
    pub async fn insert(&self, record: &TweetProcessRecord) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO tweet_processes
                (tweet_process_id, tweet_author_id, tweet_content, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id
            "#,
        )
        .bind(&record.tweet_process_id)
        .bind(&record.tweet_author_id)
        .bind(&record.tweet_content)
        .bind(&record.status)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Gets a run by its external ID.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get(&self, tweet_process_id: &str) -> Result<Option<TweetProcessRecord>> {
        let record = sqlx::query_as::<_, TweetProcessRecord>(
            r#"
            SELECT id, tweet_process_id, tweet_author_id, tweet_content, status, market_effect,
                   trades, error_type, error_message, created_at, updated_at, completed_at
            FROM tweet_processes
            WHERE tweet_process_id = $1
            "#,
        )
        .bind(tweet_process_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Gets recent runs, newest first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_recent(&self, limit: i64) -> Result<Vec<TweetProcessRecord>> {
        let records = sqlx::query_as::<_, TweetProcessRecord>(
            r#"
            SELECT id, tweet_process_id, tweet_author_id, tweet_content, status, market_effect,
                   trades, error_type, error_message, created_at, updated_at, completed_at
            FROM tweet_processes
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Moves a submitted run to `completed`.
    ///
    /// `trades` is stored only when given; a non-market-moving run keeps it
    /// null.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn complete(
        &self,
        tweet_process_id: &str,
        market_effect: Option<bool>,
        trades: Option<&JsonValue>,
        at: DateTime<Utc>,
    ) -> Result<Transition> {
        let result = sqlx::query(
            r#"
            UPDATE tweet_processes
            SET status = 'completed', market_effect = $2, trades = $3,
                updated_at = $4, completed_at = $4
            WHERE tweet_process_id = $1 AND status = 'submitted'
            "#,
        )
        .bind(tweet_process_id)
        .bind(market_effect)
        .bind(trades)
        .bind(at)
        .execute(&self.pool)
        .await?;

        self.resolve_transition(tweet_process_id, result.rows_affected())
            .await
    }

    /// Moves a submitted run to `error`.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fail(
        &self,
        tweet_process_id: &str,
        error_type: Option<&str>,
        error_message: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Transition> {
        let result = sqlx::query(
            r#"
            UPDATE tweet_processes
            SET status = 'error', error_type = $2, error_message = $3,
                updated_at = $4, completed_at = $4
            WHERE tweet_process_id = $1 AND status = 'submitted'
            "#,
        )
        .bind(tweet_process_id)
        .bind(error_type)
        .bind(error_message)
        .bind(at)
        .execute(&self.pool)
        .await?;

        self.resolve_transition(tweet_process_id, result.rows_affected())
            .await
    }

    /// Distinguishes a missing row from one that was already terminal.
    async fn resolve_transition(
        &self,
        tweet_process_id: &str,
        rows_affected: u64,
    ) -> Result<Transition> {
        if rows_affected > 0 {
            return Ok(Transition::Applied);
        }

        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM tweet_processes WHERE tweet_process_id = $1")
                .bind(tweet_process_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match status {
            None => Transition::NotFound,
            Some((s,)) => Transition::AlreadyTerminal(
                TweetProcessStatus::parse(&s).unwrap_or(TweetProcessStatus::Error),
            ),
        })
    }
}
