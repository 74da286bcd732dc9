//! Brokerage seam consumed by the execution engine.

use crate::client::AlpacaClient;
use crate::error::Result;
use crate::types::{
    ContractPage, ContractQuery, OptionSnapshot, Order, OrderQuery, OrderRequest, Position, Quote,
    Trade,
};
use async_trait::async_trait;
use rust_decimal::Decimal;

// =============================================================================
// Brokerage Trait
// =============================================================================

/// Operations the engine needs from a brokerage.
///
/// Market-data calls (`latest_quote`, `latest_trade`, `option_snapshot`) go
/// to the data endpoint; everything else goes to the trading endpoint.
/// Implementations apply their own per-call timeout and never retry.
#[async_trait]
pub trait Brokerage: Send + Sync {
    /// Latest NBBO quote for a stock.
    async fn latest_quote(&self, symbol: &str) -> Result<Quote>;

    /// Latest trade print for a stock.
    async fn latest_trade(&self, symbol: &str) -> Result<Trade>;

    /// One page of options contracts. Pass the previous page's
    /// `next_page_token` to continue.
    async fn list_option_contracts(
        &self,
        query: &ContractQuery,
        page_token: Option<&str>,
    ) -> Result<ContractPage>;

    /// Latest quote and trade for an options contract.
    async fn option_snapshot(&self, symbol: &str) -> Result<OptionSnapshot>;

    /// Places one order.
    ///
    /// # Errors
    /// - `AlpacaError::Api` - brokerage rejected the order with a structured body
    /// - `AlpacaError::Unexpected` - any other non-success response
    async fn submit_order(&self, order: &OrderRequest) -> Result<Order>;

    /// Closes `percentage` of a position, or all of it when `None`.
    async fn close_position(&self, symbol: &str, percentage: Option<Decimal>) -> Result<Order>;

    async fn list_positions(&self) -> Result<Vec<Position>>;

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>>;
}

#[async_trait]
impl Brokerage for AlpacaClient {
    async fn latest_quote(&self, symbol: &str) -> Result<Quote> {
        self.get_latest_quote(symbol).await
    }

    async fn latest_trade(&self, symbol: &str) -> Result<Trade> {
        self.get_latest_trade(symbol).await
    }

    async fn list_option_contracts(
        &self,
        query: &ContractQuery,
        page_token: Option<&str>,
    ) -> Result<ContractPage> {
        self.get_option_contracts(query, page_token).await
    }

    async fn option_snapshot(&self, symbol: &str) -> Result<OptionSnapshot> {
        self.get_option_snapshot(symbol).await
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<Order> {
        self.create_order(order).await
    }

    async fn close_position(&self, symbol: &str, percentage: Option<Decimal>) -> Result<Order> {
        self.delete_position(symbol, percentage).await
    }

    async fn list_positions(&self) -> Result<Vec<Position>> {
        self.get_positions().await
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        self.get_orders(query).await
    }
}
