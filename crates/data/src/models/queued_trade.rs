//! Trades deferred for later execution.

use chrono::{DateTime, NaiveDate, Utc};
use newsflow_core::TradeAction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A row of `queued_trades`.
///
/// Holds the originally requested parameters. `executed` is flipped by the
/// drain process, never by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueuedTradeRecord {
    /// Auto-generated ID.
    pub id: i64,
    pub tweet_process_id: String,
    pub ticker: String,
    /// "stock" or "option".
    pub instrument: String,
    /// "buy", "sell", "call" or "put".
    pub action: String,
    pub dollar_amount: Decimal,
    pub reasoning: String,
    pub confidence: Option<f64>,
    /// Holding period for stock trades.
    pub days_to_hold: Option<i32>,
    /// Requested expiry for options trades.
    pub target_expiry_date: Option<NaiveDate>,
    /// Why immediate execution did not happen, if it was attempted.
    pub failure_reason: Option<String>,
    pub queued_at: DateTime<Utc>,
    pub executed: bool,
}

impl QueuedTradeRecord {
    /// Creates a pending queued trade.
    #[must_use]
    pub fn new(
        tweet_process_id: impl Into<String>,
        ticker: impl Into<String>,
        action: TradeAction,
        dollar_amount: Decimal,
        queued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            tweet_process_id: tweet_process_id.into(),
            ticker: ticker.into(),
            instrument: action.instrument().as_str().to_string(),
            action: action.as_str().to_string(),
            dollar_amount,
            reasoning: String::new(),
            confidence: None,
            days_to_hold: None,
            target_expiry_date: None,
            failure_reason: None,
            queued_at,
            executed: false,
        }
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: Option<f64>) -> Self {
        self.confidence = confidence;
        self
    }

    #[must_use]
    pub fn with_days_to_hold(mut self, days: Option<i32>) -> Self {
        self.days_to_hold = days;
        self
    }

    #[must_use]
    pub fn with_target_expiry(mut self, expiry: Option<NaiveDate>) -> Self {
        self.target_expiry_date = expiry;
        self
    }

    #[must_use]
    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_derives_instrument_from_action() {
        let stock = QueuedTradeRecord::new("tp-1", "AAPL", TradeAction::Sell, dec!(500), Utc::now());
        assert_eq!(stock.instrument, "stock");
        assert_eq!(stock.action, "sell");
        assert!(!stock.executed);

        let option = QueuedTradeRecord::new("tp-1", "AAPL", TradeAction::Put, dec!(500), Utc::now())
            .with_target_expiry(NaiveDate::from_ymd_opt(2025, 2, 14))
            .with_failure_reason("price unavailable");
        assert_eq!(option.instrument, "option");
        assert_eq!(option.failure_reason.as_deref(), Some("price unavailable"));
        assert!(option.target_expiry_date.is_some());
    }
}
