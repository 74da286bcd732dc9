//! Analysis run for one ingested post.

use chrono::{DateTime, Utc};
use newsflow_core::TradeIntent;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Lifecycle of an analysis run. `Submitted` moves to exactly one of the
/// terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TweetProcessStatus {
    Submitted,
    Completed,
    Error,
}

impl TweetProcessStatus {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "submitted" => Some(Self::Submitted),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitted)
    }
}

/// A row of `tweet_processes`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TweetProcessRecord {
    /// Surrogate key, set by the database.
    pub id: i64,
    /// External identifier shared with the workflow.
    pub tweet_process_id: String,
    pub tweet_author_id: String,
    pub tweet_content: String,
    /// "submitted", "completed" or "error".
    pub status: String,
    /// Null until the workflow reports, and for error runs.
    pub market_effect: Option<bool>,
    /// Snapshot of the proposed trades, only for market-moving runs.
    pub trades: Option<JsonValue>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TweetProcessRecord {
    /// Creates a freshly submitted run.
    #[must_use]
    pub fn submitted(
        tweet_process_id: impl Into<String>,
        tweet_author_id: impl Into<String>,
        tweet_content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            tweet_process_id: tweet_process_id.into(),
            tweet_author_id: tweet_author_id.into(),
            tweet_content: tweet_content.into(),
            status: TweetProcessStatus::Submitted.as_str().to_string(),
            market_effect: None,
            trades: None,
            error_type: None,
            error_message: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Parsed status, `None` if the column holds an unknown value.
    #[must_use]
    pub fn status(&self) -> Option<TweetProcessStatus> {
        TweetProcessStatus::parse(&self.status)
    }

    /// Decodes the trades snapshot. Entries that no longer parse are skipped.
    #[must_use]
    pub fn trade_intents(&self) -> Vec<TradeIntent> {
        match &self.trades {
            Some(JsonValue::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}
