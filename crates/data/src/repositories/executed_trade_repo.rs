//! Executed trade repository.

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::ExecutedTradeRecord;

/// Repository for executed trade operations. Rows are never updated.
#[derive(Debug, Clone)]
pub struct ExecutedTradeRepository {
    pool: PgPool,
}

impl ExecutedTradeRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts an executed trade and returns the generated ID.
    ///
    /// # Errors
    /// Returns an error if the database operation fails, including a
    /// second insert for the same `order_id`.
    pub async fn insert(&self, record: &ExecutedTradeRecord) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO executed_trades
                (tweet_process_id, ticker, symbol, instrument, action, order_id, quantity,
                 fill_price, dollar_amount, reasoning, days_to_hold, expiry_date, strike_price,
                 executed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(&record.tweet_process_id)
        .bind(&record.ticker)
        .bind(&record.symbol)
        .bind(&record.instrument)
        .bind(&record.action)
        .bind(&record.order_id)
        .bind(record.quantity)
        .bind(record.fill_price)
        .bind(record.dollar_amount)
        .bind(&record.reasoning)
        .bind(record.days_to_hold)
        .bind(record.expiry_date)
        .bind(record.strike_price)
        .bind(record.executed_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Gets recent executed trades, newest first, optionally for one run.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_recent(
        &self,
        limit: i64,
        tweet_process_id: Option<&str>,
    ) -> Result<Vec<ExecutedTradeRecord>> {
        let records = sqlx::query_as::<_, ExecutedTradeRecord>(
            r#"
            SELECT id, tweet_process_id, ticker, symbol, instrument, action, order_id, quantity,
                   fill_price, dollar_amount, reasoning, days_to_hold, expiry_date, strike_price,
                   executed_at
            FROM executed_trades
            WHERE ($2::TEXT IS NULL OR tweet_process_id = $2)
            ORDER BY executed_at DESC
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
    pub async fn get_statistics(&self) -> Result<ExecutedTradeStatistics> {
        let result: (Option<i64>, Option<i64>, Option<Decimal>) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) as total,
                COUNT(*) FILTER (WHERE instrument = 'option') as options,
                SUM(dollar_amount) as total_amount
            FROM executed_trades
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ExecutedTradeStatistics {
            total: result.0.unwrap_or(0),
            options: result.1.unwrap_or(0),
            total_amount: result.2.unwrap_or(Decimal::ZERO),
        })
    }
}

/// Aggregate executed trade statistics.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ExecutedTradeStatistics {
    pub total: i64,
    /// How many of `total` were options contracts.
    pub options: i64,
    pub total_amount: Decimal,
}
