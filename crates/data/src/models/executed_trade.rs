//! Trades that reached the brokerage.

use chrono::{DateTime, NaiveDate, Utc};
use newsflow_core::TradeAction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A row of `executed_trades`. Append-only.
///
/// Symbol, amount and expiry describe what was actually placed, which for
/// options may differ from what was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExecutedTradeRecord {
    /// Auto-generated ID.
    pub id: i64,
    pub tweet_process_id: String,
    /// Underlying ticker.
    pub ticker: String,
    /// Traded symbol: the ticker for stock, the OCC symbol for options.
    pub symbol: String,
    pub instrument: String,
    pub action: String,
    /// Brokerage order ID.
    pub order_id: String,
    /// Shares or contracts. Null for notional stock orders not yet filled.
    pub quantity: Option<Decimal>,
    /// Average fill price, or the price used for sizing when unfilled.
    pub fill_price: Option<Decimal>,
    pub dollar_amount: Decimal,
    pub reasoning: String,
    pub days_to_hold: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
    pub strike_price: Option<Decimal>,
    pub executed_at: DateTime<Utc>,
}

impl ExecutedTradeRecord {
    #[must_use]
    pub fn new(
        tweet_process_id: impl Into<String>,
        ticker: impl Into<String>,
        symbol: impl Into<String>,
        action: TradeAction,
        order_id: impl Into<String>,
        dollar_amount: Decimal,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            tweet_process_id: tweet_process_id.into(),
            ticker: ticker.into(),
            symbol: symbol.into(),
            instrument: action.instrument().as_str().to_string(),
            action: action.as_str().to_string(),
            order_id: order_id.into(),
            quantity: None,
            fill_price: None,
            dollar_amount,
            reasoning: String::new(),
            days_to_hold: None,
            expiry_date: None,
            strike_price: None,
            executed_at,
        }
    }

    #[must_use]
    pub fn with_fill(mut self, quantity: Option<Decimal>, price: Option<Decimal>) -> Self {
        self.quantity = quantity;
        self.fill_price = price;
        self
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    #[must_use]
    pub fn with_days_to_hold(mut self, days: Option<i32>) -> Self {
        self.days_to_hold = days;
        self
    }

    #[must_use]
    pub fn with_contract(mut self, expiry: NaiveDate, strike: Decimal) -> Self {
        self.expiry_date = Some(expiry);
        self.strike_price = Some(strike);
        self
    }
}
