//! Current prices from the brokerage market-data endpoint.

use std::sync::Arc;

use newsflow_alpaca::Brokerage;
use rust_decimal::Decimal;

use crate::error::ExecutionError;

/// Which print a stock price is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBasis {
    /// Latest trade price. Used as the reference for strike filtering.
    LastTrade,
    /// Latest ask. Used for protective limit prices.
    Ask,
}

/// Looks up current stock and options prices. Never returns a price <= 0.
#[derive(Clone)]
pub struct PriceLookup {
    broker: Arc<dyn Brokerage>,
}

impl PriceLookup {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }

    /// Current price of a stock on the requested basis.
    ///
    /// # Errors
    /// Returns [`ExecutionError::PriceUnavailable`] when the fetch fails or
    /// the price is missing, zero, or negative.
    pub async fn stock_price(
        &self,
        symbol: &str,
        basis: PriceBasis,
    ) -> Result<Decimal, ExecutionError> {
        let price = match basis {
            PriceBasis::LastTrade => {
                self.broker
                    .latest_trade(symbol)
                    .await
                    .map_err(|e| ExecutionError::price_unavailable(symbol, e.to_string()))?
                    .price
            }
            PriceBasis::Ask => {
                self.broker
                    .latest_quote(symbol)
                    .await
                    .map_err(|e| ExecutionError::price_unavailable(symbol, e.to_string()))?
                    .ask_price
            }
        };

        positive(price).ok_or_else(|| {
            ExecutionError::price_unavailable(symbol, format!("no positive {basis:?} price"))
        })
    }

    /// Current price of an options contract: the ask, or the last trade when
    /// the ask is absent or not positive.
    ///
    /// # Errors
    /// Returns [`ExecutionError::PriceUnavailable`] when neither is usable.
    pub async fn contract_price(&self, option_symbol: &str) -> Result<Decimal, ExecutionError> {
        let snapshot = self
            .broker
            .option_snapshot(option_symbol)
            .await
            .map_err(|e| ExecutionError::price_unavailable(option_symbol, e.to_string()))?;

        let ask = snapshot.latest_quote.and_then(|q| positive(q.ask_price));
        let last = snapshot.latest_trade.and_then(|t| positive(t.price));

        ask.or(last).ok_or_else(|| {
            ExecutionError::price_unavailable(option_symbol, "no positive ask or trade price")
        })
    }
}

fn positive(price: Option<Decimal>) -> Option<Decimal> {
    price.filter(|p| *p > Decimal::ZERO)
}
