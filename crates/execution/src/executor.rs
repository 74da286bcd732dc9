//! Order execution: validate, resolve the instrument, size, submit once.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use newsflow_alpaca::{Brokerage, OptionContract, Order, OrderRequest, OrderSide};
use newsflow_core::{market_clock, Clock, InstrumentKind, TradeAction, TradePlan, TradingPolicy};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::contracts::ContractFinder;
use crate::error::ExecutionError;
use crate::pricing::{PriceBasis, PriceLookup};
use crate::selector::select_best;
use crate::sizing::{option_quantity, stock_notional, CONTRACT_MULTIPLIER};

/// Fraction of the dollar amount used as the extended-hours limit price when
/// no live ask is available.
const EXTENDED_HOURS_FALLBACK_RATIO: Decimal = dec!(0.01);

/// One order to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub ticker: String,
    pub action: TradeAction,
    pub dollar_amount: Decimal,
    /// Desired expiry for options; defaults to the short horizon.
    #[serde(default)]
    pub target_expiry: Option<NaiveDate>,
    /// Place a protective limit order eligible outside regular hours.
    /// Stock only.
    #[serde(default)]
    pub extended_hours: bool,
}

impl ExecutionRequest {
    #[must_use]
    pub fn new(ticker: impl Into<String>, action: TradeAction, dollar_amount: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            action,
            dollar_amount,
            target_expiry: None,
            extended_hours: false,
        }
    }

    #[must_use]
    pub fn from_plan(plan: &TradePlan) -> Self {
        Self {
            ticker: plan.ticker.clone(),
            action: plan.action,
            dollar_amount: plan.dollar_amount,
            target_expiry: plan.target_expiry,
            extended_hours: false,
        }
    }

    #[must_use]
    pub fn with_target_expiry(mut self, expiry: NaiveDate) -> Self {
        self.target_expiry = Some(expiry);
        self
    }

    #[must_use]
    pub fn with_extended_hours(mut self, extended_hours: bool) -> Self {
        self.extended_hours = extended_hours;
        self
    }
}

/// What was actually placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    /// Brokerage confirmation.
    pub order: Order,
    /// Traded symbol: the ticker, or the selected contract's OCC symbol.
    pub symbol: String,
    pub instrument: InstrumentKind,
    /// Shares or contracts, filled if known, otherwise requested.
    pub quantity: Option<Decimal>,
    /// Fill price if known, otherwise the price used for sizing or the limit.
    pub price: Option<Decimal>,
    /// Dollar value of the order as placed.
    pub dollar_amount: Decimal,
    /// Selected contract for options orders.
    pub contract: Option<OptionContract>,
}

/// Places orders against the brokerage. One submission per call, no retries.
#[derive(Clone)]
pub struct OrderExecutor {
    broker: Arc<dyn Brokerage>,
    clock: Arc<dyn Clock>,
    policy: TradingPolicy,
    prices: PriceLookup,
    contracts: ContractFinder,
}

impl OrderExecutor {
    pub fn new(broker: Arc<dyn Brokerage>, clock: Arc<dyn Clock>, policy: TradingPolicy) -> Self {
        Self {
            prices: PriceLookup::new(broker.clone()),
            contracts: ContractFinder::new(broker.clone()),
            broker,
            clock,
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &TradingPolicy {
        &self.policy
    }

    /// True if the regular session is open now.
    #[must_use]
    pub fn market_open(&self) -> bool {
        market_clock::is_open(self.clock.now())
    }

    /// Validates and places one order.
    ///
    /// Nothing is submitted when any step before submission fails.
    ///
    /// # Errors
    /// - `Validation` - empty ticker, non-positive amount, market closed
    ///   without the extended-hours path, or extended hours for options
    /// - `PriceUnavailable`, `ContractFetch`, `NoContractsAvailable`,
    ///   `BudgetTooSmall` - options resolution failed
    /// - `Brokerage` / `Internal` - submission failed
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionReport, ExecutionError> {
        let ticker = request.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(ExecutionError::validation("ticker must not be empty"));
        }
        if request.dollar_amount <= Decimal::ZERO {
            return Err(ExecutionError::validation(format!(
                "dollar amount must be positive, got {}",
                request.dollar_amount
            )));
        }

        let instrument = request.action.instrument();
        if request.extended_hours && instrument == InstrumentKind::Option {
            return Err(ExecutionError::validation(
                "extended-hours orders are only supported for stock",
            ));
        }
        if !request.extended_hours && !self.market_open() {
            return Err(ExecutionError::validation("market is closed"));
        }

        match instrument {
            InstrumentKind::Stock => self.execute_stock(&ticker, request).await,
            InstrumentKind::Option => self.execute_option(&ticker, request).await,
        }
    }

    async fn execute_stock(
        &self,
        ticker: &str,
        request: &ExecutionRequest,
    ) -> Result<ExecutionReport, ExecutionError> {
        let side = match request.action {
            TradeAction::Sell => OrderSide::Sell,
            _ => OrderSide::Buy,
        };
        let notional = stock_notional(request.dollar_amount)?;

        let (order_request, limit_price) = if request.extended_hours {
            let limit = self.extended_hours_limit(ticker, notional).await;
            (
                OrderRequest::extended_hours_limit(ticker, side, notional, limit),
                Some(limit),
            )
        } else {
            (OrderRequest::notional_market(ticker, side, notional), None)
        };

        let order = self.submit(&order_request).await?;

        let filled = order.filled_quantity();
        let (quantity, price, dollar_amount) = match order.filled_avg_price {
            Some(avg) if filled > Decimal::ZERO => (Some(filled), Some(avg), (filled * avg).round_dp(2)),
            _ => (order.qty, limit_price, notional),
        };

        Ok(ExecutionReport {
            symbol: order.symbol.clone(),
            instrument: InstrumentKind::Stock,
            quantity,
            price,
            dollar_amount,
            contract: None,
            order,
        })
    }

    async fn execute_option(
        &self,
        ticker: &str,
        request: &ExecutionRequest,
    ) -> Result<ExecutionReport, ExecutionError> {
        let right = request
            .action
            .option_right()
            .ok_or_else(|| ExecutionError::Internal("option order without a right".to_string()))?;

        let underlying_price = self.prices.stock_price(ticker, PriceBasis::LastTrade).await?;

        let today = market_clock::trading_date(self.clock.now());
        let target = request
            .target_expiry
            .unwrap_or_else(|| today + Duration::days(self.policy.short_horizon_days));
        let window_end = target + Duration::days(self.policy.contract_window_days);

        let candidates = self
            .contracts
            .find_contracts(ticker, target, window_end, right)
            .await?;
        debug!(
            ticker,
            %target,
            %window_end,
            candidates = candidates.len(),
            "Contracts in expiry window"
        );

        let contract = select_best(&candidates, target, underlying_price)?;
        let contract_price = self.prices.contract_price(&contract.symbol).await?;
        let quantity = option_quantity(request.dollar_amount, contract_price)?;

        info!(
            ticker,
            symbol = %contract.symbol,
            expiry = %contract.expiration_date,
            strike = %contract.strike_price,
            %underlying_price,
            %contract_price,
            quantity,
            "Selected options contract"
        );

        let order = self
            .submit(&OrderRequest::quantity_market(
                &contract.symbol,
                OrderSide::Buy,
                quantity,
            ))
            .await?;

        let filled = order.filled_quantity();
        let (qty, price) = match order.filled_avg_price {
            Some(avg) if filled > Decimal::ZERO => (filled, avg),
            _ => (Decimal::from(quantity), contract_price),
        };

        Ok(ExecutionReport {
            symbol: order.symbol.clone(),
            instrument: InstrumentKind::Option,
            quantity: Some(qty),
            price: Some(price),
            dollar_amount: (qty * price * CONTRACT_MULTIPLIER).round_dp(2),
            contract: Some(contract),
            order,
        })
    }

    /// Protective limit: ask x markup, rounded to cents.
    async fn extended_hours_limit(&self, ticker: &str, notional: Decimal) -> Decimal {
        match self.prices.stock_price(ticker, PriceBasis::Ask).await {
            Ok(ask) => round_to_cents(ask * self.policy.extended_hours_markup),
            Err(e) => {
                // Amount-based limit; unrelated to the share price.
                let fallback = round_to_cents(notional * EXTENDED_HOURS_FALLBACK_RATIO);
                warn!(
                    ticker,
                    error = %e,
                    %notional,
                    limit_price = %fallback,
                    "Live ask unavailable, using amount-based limit price"
                );
                fallback
            }
        }
    }

    async fn submit(&self, order: &OrderRequest) -> Result<Order, ExecutionError> {
        let confirmation = self.broker.submit_order(order).await.map_err(|e| {
            warn!(symbol = %order.symbol, error = %e, "Order submission failed");
            ExecutionError::from(e)
        })?;

        info!(
            order_id = %confirmation.id,
            symbol = %confirmation.symbol,
            status = %confirmation.status,
            "Order accepted"
        );
        Ok(confirmation)
    }
}

fn round_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
