//! Persistence seam for reconciliation and workflow completion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newsflow_data::{
    ExecutedTradeRecord, QueuedTradeRecord, Repositories, Transition, TweetProcessRecord,
};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// A failed write or read. Terminal for the row in hand.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("persistence error: {0}")]
pub struct StoreError(pub String);

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        Self(format!("{err:#}"))
    }
}

/// Durable state the engine writes. Each call is its own atomic unit.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn create_process(&self, record: &TweetProcessRecord) -> Result<i64, StoreError>;

    /// Guarded submitted -> completed transition.
    async fn complete_process(
        &self,
        tweet_process_id: &str,
        market_effect: Option<bool>,
        trades: Option<&JsonValue>,
        at: DateTime<Utc>,
    ) -> Result<Transition, StoreError>;

    /// Guarded submitted -> error transition.
    async fn fail_process(
        &self,
        tweet_process_id: &str,
        error_type: Option<&str>,
        error_message: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Transition, StoreError>;

    async fn record_queued(&self, trade: &QueuedTradeRecord) -> Result<i64, StoreError>;

    async fn record_executed(&self, trade: &ExecutedTradeRecord) -> Result<i64, StoreError>;
}

#[async_trait]
impl TradeStore for Repositories {
    async fn create_process(&self, record: &TweetProcessRecord) -> Result<i64, StoreError> {
        Ok(self.tweet_processes.insert(record).await?)
    }

    async fn complete_process(
        &self,
        tweet_process_id: &str,
        market_effect: Option<bool>,
        trades: Option<&JsonValue>,
        at: DateTime<Utc>,
    ) -> Result<Transition, StoreError> {
        Ok(self
            .tweet_processes
            .complete(tweet_process_id, market_effect, trades, at)
            .await?)
    }

    async fn fail_process(
        &self,
        tweet_process_id: &str,
        error_type: Option<&str>,
        error_message: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Transition, StoreError> {
        Ok(self
            .tweet_processes
            .fail(tweet_process_id, error_type, error_message, at)
            .await?)
    }

    async fn record_queued(&self, trade: &QueuedTradeRecord) -> Result<i64, StoreError> {
        Ok(self.queued_trades.insert(trade).await?)
    }

    async fn record_executed(&self, trade: &ExecutedTradeRecord) -> Result<i64, StoreError> {
        Ok(self.executed_trades.insert(trade).await?)
    }
}
