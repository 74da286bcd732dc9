//! Data models for the Alpaca trading and market-data APIs.
//!
//! Alpaca returns most numeric fields as strings; `Decimal` accepts both
//! strings and numbers on the way in and is written as a string on the way
//! out.

use chrono::{DateTime, NaiveDate, Utc};
use newsflow_core::OptionRight;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Market Data
// =============================================================================

/// Latest NBBO quote for a stock or options contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "ap", default)]
    pub ask_price: Option<Decimal>,

    #[serde(rename = "bp", default)]
    pub bid_price: Option<Decimal>,

    #[serde(rename = "as", default)]
    pub ask_size: Option<Decimal>,

    #[serde(rename = "bs", default)]
    pub bid_size: Option<Decimal>,

    #[serde(rename = "t", default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Latest trade print.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(rename = "p", default)]
    pub price: Option<Decimal>,

    #[serde(rename = "s", default)]
    pub size: Option<Decimal>,

    #[serde(rename = "t", default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Snapshot of an options contract: latest quote and latest trade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSnapshot {
    #[serde(default)]
    pub latest_quote: Option<Quote>,

    #[serde(default)]
    pub latest_trade: Option<Trade>,
}

// =============================================================================
// Options Contracts
// =============================================================================

/// A listed options contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// OCC symbol, e.g. `AAPL250117C00150000`.
    pub symbol: String,

    pub underlying_symbol: String,

    pub expiration_date: NaiveDate,

    pub strike_price: Decimal,

    #[serde(rename = "type")]
    pub contract_type: OptionRight,

    /// Previous session close, absent for contracts that never traded.
    #[serde(default)]
    pub close_price: Option<Decimal>,
}

/// Filter for the contracts listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractQuery {
    pub underlying_symbol: String,
    pub expiration_from: NaiveDate,
    pub expiration_to: NaiveDate,
    pub contract_type: OptionRight,
    /// Page size, capped by the API at 10000.
    pub limit: u32,
}

impl ContractQuery {
    /// Default page size, the largest the API accepts.
    pub const DEFAULT_LIMIT: u32 = 10_000;

    #[must_use]
    pub fn new(
        underlying_symbol: impl Into<String>,
        expiration_from: NaiveDate,
        expiration_to: NaiveDate,
        contract_type: OptionRight,
    ) -> Self {
        Self {
            underlying_symbol: underlying_symbol.into(),
            expiration_from,
            expiration_to,
            contract_type,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// One page of the contracts listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractPage {
    #[serde(rename = "option_contracts", default)]
    pub contracts: Vec<OptionContract>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
    TrailingStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Day,
    Gtc,
    Opg,
    Cls,
    Ioc,
    Fok,
}

/// Order submission payload for `POST /v2/orders`.
///
/// Exactly one of `qty` and `notional` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notional: Option<Decimal>,

    pub side: OrderSide,

    #[serde(rename = "type")]
    pub order_type: OrderType,

    pub time_in_force: TimeInForce,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub extended_hours: bool,
}

impl OrderRequest {
    /// Market order sized in dollars.
    #[must_use]
    pub fn notional_market(symbol: impl Into<String>, side: OrderSide, notional: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            qty: None,
            notional: Some(notional),
            side,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Day,
            limit_price: None,
            extended_hours: false,
        }
    }

    /// Market order for a whole number of units (shares or contracts).
    #[must_use]
    pub fn quantity_market(symbol: impl Into<String>, side: OrderSide, qty: u32) -> Self {
        Self {
            symbol: symbol.into(),
            qty: Some(Decimal::from(qty)),
            notional: None,
            side,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Day,
            limit_price: None,
            extended_hours: false,
        }
    }

    /// Dollar-sized limit order eligible for pre/post-market execution.
    #[must_use]
    pub fn extended_hours_limit(
        symbol: impl Into<String>,
        side: OrderSide,
        notional: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            qty: None,
            notional: Some(notional),
            side,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Day,
            limit_price: Some(limit_price),
            extended_hours: true,
        }
    }
}

/// Order as reported by the brokerage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,

    #[serde(default)]
    pub client_order_id: Option<String>,

    pub symbol: String,

    /// Raw status string (`new`, `accepted`, `filled`, `partially_filled`, ...).
    pub status: String,

    #[serde(default)]
    pub side: Option<OrderSide>,

    #[serde(rename = "type", default)]
    pub order_type: Option<OrderType>,

    #[serde(default)]
    pub qty: Option<Decimal>,

    #[serde(default)]
    pub notional: Option<Decimal>,

    #[serde(default)]
    pub filled_qty: Option<Decimal>,

    #[serde(default)]
    pub filled_avg_price: Option<Decimal>,

    #[serde(default)]
    pub limit_price: Option<Decimal>,

    #[serde(default)]
    pub extended_hours: bool,

    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub filled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Filled quantity, treating a missing field as zero.
    #[must_use]
    pub fn filled_quantity(&self) -> Decimal {
        self.filled_qty.unwrap_or_default()
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.status == "filled"
    }
}

/// Filter for `GET /v2/orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    /// `open`, `closed` or `all`; the API defaults to `open`.
    pub status: Option<String>,
    pub limit: Option<u32>,
}

// =============================================================================
// Positions
// =============================================================================

/// An open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,

    #[serde(default)]
    pub asset_class: Option<String>,

    pub qty: Decimal,

    #[serde(default)]
    pub side: Option<String>,

    #[serde(default)]
    pub avg_entry_price: Option<Decimal>,

    #[serde(default)]
    pub current_price: Option<Decimal>,

    #[serde(default)]
    pub market_value: Option<Decimal>,

    #[serde(default)]
    pub unrealized_pl: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_contract_deserializes_string_numbers() {
        let json = serde_json::json!({
            "id": "6e58f870-fe73-4583-81e4-b9a37892c36f",
            "symbol": "AAPL250117C00150000",
            "name": "AAPL Jan 17 2025 150 Call",
            "status": "active",
            "tradable": true,
            "expiration_date": "2025-01-17",
            "root_symbol": "AAPL",
            "underlying_symbol": "AAPL",
            "type": "call",
            "style": "american",
            "strike_price": "150",
            "size": "100",
            "close_price": null
        });

        let contract: OptionContract = serde_json::from_value(json).unwrap();
        assert_eq!(contract.strike_price, dec!(150));
        assert_eq!(contract.contract_type, OptionRight::Call);
        assert_eq!(
            contract.expiration_date,
            NaiveDate::from_ymd_opt(2025, 1, 17).unwrap()
        );
        assert_eq!(contract.close_price, None);
    }

    #[test]
    fn test_notional_order_serialization_omits_qty() {
        let order = OrderRequest::notional_market("AAPL", OrderSide::Buy, dec!(750.00));
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["symbol"], "AAPL");
        assert_eq!(json["notional"], "750.00");
        assert_eq!(json["type"], "market");
        assert_eq!(json["time_in_force"], "day");
        assert!(json.get("qty").is_none());
        assert!(json.get("limit_price").is_none());
        assert!(json.get("extended_hours").is_none());
    }

    #[test]
    fn test_extended_hours_order_serialization() {
        let order =
            OrderRequest::extended_hours_limit("TSLA", OrderSide::Sell, dec!(500), dec!(204.00));
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["type"], "limit");
        assert_eq!(json["side"], "sell");
        assert_eq!(json["limit_price"], "204.00");
        assert_eq!(json["extended_hours"], true);
    }

    #[test]
    fn test_order_confirmation_parses() {
        let json = serde_json::json!({
            "id": "61e69015-8549-4bfd-b9c3-01e75843f47d",
            "client_order_id": "eb9e2aaa-f71a-4f51-b5b4-52a6c565dad4",
            "symbol": "AAPL250117C00150000",
            "status": "filled",
            "side": "buy",
            "type": "market",
            "qty": "4",
            "notional": null,
            "filled_qty": "4",
            "filled_avg_price": "12.35",
            "submitted_at": "2024-11-04T15:01:02.123456Z",
            "filled_at": "2024-11-04T15:01:02.523456Z"
        });

        let order: Order = serde_json::from_value(json).unwrap();
        assert!(order.is_filled());
        assert_eq!(order.filled_quantity(), dec!(4));
        assert_eq!(order.filled_avg_price, Some(dec!(12.35)));
        assert_eq!(order.order_type, Some(OrderType::Market));
    }

    #[test]
    fn test_snapshot_uses_camel_case_keys() {
        let json = serde_json::json!({
            "latestQuote": {"ap": 3.1, "bp": 2.9, "as": 10, "bs": 4},
            "latestTrade": {"p": 3.0, "s": 1}
        });

        let snapshot: OptionSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.latest_quote.unwrap().ask_price, Some(dec!(3.1)));
        assert_eq!(snapshot.latest_trade.unwrap().price, Some(dec!(3.0)));
    }
}
