//! Queued trade repository.

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::QueuedTradeRecord;

/// Repository for queued trade operations.
#[derive(Debug, Clone)]
pub struct QueuedTradeRepository {
    pool: PgPool,
}

impl QueuedTradeRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a queued trade and returns the generated ID.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert(&self, record: &QueuedTradeRecord) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO queued_trades
                (tweet_process_id, ticker, instrument, action, dollar_amount, reasoning,
                 confidence, days_to_hold, target_expiry_date, failure_reason, queued_at, executed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(&record.tweet_process_id)
        .bind(&record.ticker)
        .bind(&record.instrument)
        .bind(&record.action)
        .bind(record.dollar_amount)
        .bind(&record.reasoning)
        .bind(record.confidence)
        .bind(record.days_to_hold)
        .bind(record.target_expiry_date)
        .bind(&record.failure_reason)
        .bind(record.queued_at)
        .bind(record.executed)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Gets recent queued trades, newest first, optionally for one run.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_recent(
        &self,
        limit: i64,
        tweet_process_id: Option<&str>,
    ) -> Result<Vec<QueuedTradeRecord>> {
        let records = sqlx::query_as::<_, QueuedTradeRecord>(
            r#"
            SELECT id, tweet_process_id, ticker, instrument, action, dollar_amount, reasoning,
                   confidence, days_to_hold, target_expiry_date, failure_reason, queued_at, executed
            FROM queued_trades
            WHERE ($2::TEXT IS NULL OR tweet_process_id = $2)
            ORDER BY queued_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(tweet_process_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Gets aggregate counts and dollar totals.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_statistics(&self) -> Result<QueuedTradeStatistics> {
        let result: (Option<i64>, Option<i64>, Option<Decimal>, Option<Decimal>) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*) as total,
                    COUNT(*) FILTER (WHERE executed = FALSE) as pending,
                    SUM(dollar_amount) as total_amount,
                    SUM(dollar_amount) FILTER (WHERE executed = FALSE) as pending_amount
                FROM queued_trades
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(QueuedTradeStatistics {
            total: result.0.unwrap_or(0),
            pending: result.1.unwrap_or(0),
            total_amount: result.2.unwrap_or(Decimal::ZERO),
            pending_amount: result.3.unwrap_or(Decimal::ZERO),
        })
    }
}

/// Aggregate queued trade statistics.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct QueuedTradeStatistics {
    pub total: i64,
    /// Not yet executed by the drain process.
    pub pending: i64,
    pub total_amount: Decimal,
    pub pending_amount: Decimal,
}
