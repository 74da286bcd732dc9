//! In-memory brokerage and store used by tests here and in downstream crates.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use newsflow_alpaca::{
    AlpacaError, Brokerage, ContractPage, ContractQuery, OptionContract, OptionSnapshot, Order,
    OrderQuery, OrderRequest, OrderSide, Position, Quote, Trade,
};
use newsflow_core::{market_clock, OptionRight};
use newsflow_data::{
    ExecutedTradeRecord, QueuedTradeRecord, Transition, TweetProcessRecord, TweetProcessStatus,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::store::{StoreError, TradeStore};

pub use newsflow_core::FixedClock;

// =============================================================================
// Clocks and fixtures
// =============================================================================

/// Wednesday 2024-11-06, 10:00 Eastern.
#[must_use]
pub fn open_clock() -> FixedClock {
    FixedClock(at(2024, 11, 6, 15))
}

/// Saturday 2024-11-09, 10:00 Eastern.
#[must_use]
pub fn closed_clock() -> FixedClock {
    FixedClock(at(2024, 11, 9, 15))
}

fn at(y: i32, m: u32, d: u32, hour_utc: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hour_utc, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Options contract with an OCC-style symbol.
#[must_use]
pub fn contract(
    underlying: &str,
    expiry: NaiveDate,
    strike: Decimal,
    right: OptionRight,
) -> OptionContract {
    let flag = match right {
        OptionRight::Call => 'C',
        OptionRight::Put => 'P',
    };
    let strike_code = (strike * Decimal::from(1000)).trunc().to_string();
    OptionContract {
        symbol: format!("{underlying}{}{flag}{strike_code:0>8}", expiry.format("%y%m%d")),
        underlying_symbol: underlying.to_string(),
        expiration_date: expiry,
        strike_price: strike,
        contract_type: right,
        close_price: None,
    }
}

// =============================================================================
// MockBrokerage
// =============================================================================

#[derive(Default)]
struct BrokerState {
    trades: HashMap<String, Decimal>,
    asks: HashMap<String, Decimal>,
    snapshots: HashMap<String, OptionSnapshot>,
    contract_pages: Vec<Vec<OptionContract>>,
    failing_page: Option<usize>,
    looping_pages: bool,
    failing_submits: HashSet<String>,
    positions: Vec<Position>,
    orders: Vec<Order>,
    submitted: Vec<OrderRequest>,
    contract_requests: Vec<(ContractQuery, Option<String>)>,
    closed: Vec<(String, Option<Decimal>)>,
}

/// Scripted [`Brokerage`] that records every call.
///
/// Notional orders come back `accepted` and unfilled. Quantity orders come
/// back `filled` at the symbol's snapshot ask, if one is configured.
#[derive(Default)]
pub struct MockBrokerage {
    state: Mutex<BrokerState>,
}

impl std::fmt::Debug for MockBrokerage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBrokerage").finish_non_exhaustive()
    }
}

impl MockBrokerage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One call contract near the money, 30 days out from [`open_clock`],
    /// priced at `ask`, on an underlying last traded at `price`.
    #[must_use]
    pub fn with_option_chain(underlying: &str, price: Decimal, ask: Decimal) -> Self {
        let expiry = market_clock::trading_date(open_clock().0) + Duration::days(30);
        let call = contract(underlying, expiry, price, OptionRight::Call);
        Self::new()
            .with_last_trade(underlying, price)
            .with_snapshot(&call.symbol, Some(ask), None)
            .with_contract_pages(vec![vec![call]])
    }

    #[must_use]
    pub fn with_last_trade(mut self, symbol: &str, price: Decimal) -> Self {
        self.state.get_mut().trades.insert(symbol.to_string(), price);
        self
    }

    #[must_use]
    pub fn with_ask(mut self, symbol: &str, ask: Decimal) -> Self {
        self.state.get_mut().asks.insert(symbol.to_string(), ask);
        self
    }

    #[must_use]
    pub fn with_snapshot(mut self, symbol: &str, ask: Option<Decimal>, last: Option<Decimal>) -> Self {
        let snapshot = OptionSnapshot {
            latest_quote: ask.map(|ask_price| Quote {
                ask_price: Some(ask_price),
                ..Quote::default()
            }),
            latest_trade: last.map(|price| Trade {
                price: Some(price),
                ..Trade::default()
            }),
        };
        self.state
            .get_mut()
            .snapshots
            .insert(symbol.to_string(), snapshot);
        self
    }

    /// Pages served in order; page `n` is requested with token `page-n`.
    #[must_use]
    pub fn with_contract_pages(mut self, pages: Vec<Vec<OptionContract>>) -> Self {
        self.state.get_mut().contract_pages = pages;
        self
    }

    /// The last page hands back its own token instead of ending the listing.
    #[must_use]
    pub fn loop_last_contract_page(mut self) -> Self {
        self.state.get_mut().looping_pages = true;
        self
    }

    /// Zero-based page index that fails with a server error.
    #[must_use]
    pub fn fail_contract_page(mut self, index: usize) -> Self {
        self.state.get_mut().failing_page = Some(index);
        self
    }

    /// Orders for `symbol` are rejected with a 403.
    #[must_use]
    pub fn fail_submit_for(mut self, symbol: &str) -> Self {
        self.state
            .get_mut()
            .failing_submits
            .insert(symbol.to_uppercase());
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.state.get_mut().positions.push(position);
        self
    }

    pub fn submitted_orders(&self) -> Vec<OrderRequest> {
        self.state.lock().submitted.clone()
    }

    pub fn contract_requests(&self) -> Vec<(ContractQuery, Option<String>)> {
        self.state.lock().contract_requests.clone()
    }

    /// `(symbol, percentage)` of every close request.
    pub fn closed_positions(&self) -> Vec<(String, Option<Decimal>)> {
        self.state.lock().closed.clone()
    }
}

/// Stock position fixture.
#[must_use]
pub fn position(symbol: &str, qty: Decimal, current_price: Decimal) -> Position {
    Position {
        symbol: symbol.to_string(),
        asset_class: Some("us_equity".to_string()),
        qty,
        side: Some("long".to_string()),
        avg_entry_price: Some(current_price),
        current_price: Some(current_price),
        market_value: Some(qty * current_price),
        unrealized_pl: Some(Decimal::ZERO),
    }
}

fn not_found(what: &str) -> AlpacaError {
    AlpacaError::api(404, format!("{what} not found"))
}

#[async_trait]
impl Brokerage for MockBrokerage {
    async fn latest_quote(&self, symbol: &str) -> newsflow_alpaca::Result<Quote> {
        let ask = self.state.lock().asks.get(symbol).copied();
        ask.map(|ask_price| Quote {
            ask_price: Some(ask_price),
            ..Quote::default()
        })
        .ok_or_else(|| not_found("quote"))
    }

    async fn latest_trade(&self, symbol: &str) -> newsflow_alpaca::Result<Trade> {
        let price = self.state.lock().trades.get(symbol).copied();
        price
            .map(|price| Trade {
                price: Some(price),
                ..Trade::default()
            })
            .ok_or_else(|| not_found("trade"))
    }

    async fn list_option_contracts(
        &self,
        query: &ContractQuery,
        page_token: Option<&str>,
    ) -> newsflow_alpaca::Result<ContractPage> {
        let mut state = self.state.lock();
        state
            .contract_requests
            .push((query.clone(), page_token.map(str::to_string)));

        let index = match page_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| AlpacaError::api(422, "invalid page token"))?,
        };
        if state.failing_page == Some(index) {
            return Err(AlpacaError::unexpected(500, "internal server error"));
        }

        let contracts = state.contract_pages.get(index).cloned().unwrap_or_default();
        let next_page_token = if index + 1 < state.contract_pages.len() {
            Some(format!("page-{}", index + 1))
        } else if state.looping_pages && page_token.is_some() {
            page_token.map(str::to_string)
        } else {
            None
        };
        Ok(ContractPage {
            contracts,
            next_page_token,
        })
    }

    async fn option_snapshot(&self, symbol: &str) -> newsflow_alpaca::Result<OptionSnapshot> {
        Ok(self
            .state
            .lock()
            .snapshots
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }

    async fn submit_order(&self, order: &OrderRequest) -> newsflow_alpaca::Result<Order> {
        let mut state = self.state.lock();
        state.submitted.push(order.clone());

        if state.failing_submits.contains(&order.symbol.to_uppercase()) {
            return Err(AlpacaError::api(403, "insufficient buying power"));
        }

        let (status, filled_qty, filled_avg_price) = match order.qty {
            Some(qty) => {
                let ask = state
                    .snapshots
                    .get(&order.symbol)
                    .and_then(|s| s.latest_quote.as_ref())
                    .and_then(|q| q.ask_price);
                ("filled", Some(qty), ask)
            }
            None => ("accepted", None, None),
        };

        let confirmation = Order {
            id: format!("order-{}", state.submitted.len()),
            client_order_id: None,
            symbol: order.symbol.clone(),
            status: status.to_string(),
            side: Some(order.side),
            order_type: Some(order.order_type),
            qty: order.qty,
            notional: order.notional,
            filled_qty,
            filled_avg_price,
            limit_price: order.limit_price,
            extended_hours: order.extended_hours,
            submitted_at: None,
            filled_at: None,
        };
        state.orders.push(confirmation.clone());
        Ok(confirmation)
    }

    async fn close_position(
        &self,
        symbol: &str,
        percentage: Option<Decimal>,
    ) -> newsflow_alpaca::Result<Order> {
        let mut state = self.state.lock();
        let held = state
            .positions
            .iter()
            .find(|p| p.symbol == symbol)
            .cloned()
            .ok_or_else(|| not_found("position"))?;
        state.closed.push((symbol.to_string(), percentage));

        let qty = match percentage {
            Some(pct) => (held.qty * pct / Decimal::ONE_HUNDRED).round_dp(9),
            None => held.qty,
        };
        Ok(Order {
            id: format!("close-{}", state.closed.len()),
            client_order_id: None,
            symbol: symbol.to_string(),
            status: "accepted".to_string(),
            side: Some(OrderSide::Sell),
            order_type: Some(newsflow_alpaca::OrderType::Market),
            qty: Some(qty),
            notional: None,
            filled_qty: None,
            filled_avg_price: None,
            limit_price: None,
            extended_hours: false,
            submitted_at: None,
            filled_at: None,
        })
    }

    async fn list_positions(&self) -> newsflow_alpaca::Result<Vec<Position>> {
        Ok(self.state.lock().positions.clone())
    }

    async fn list_orders(&self, query: &OrderQuery) -> newsflow_alpaca::Result<Vec<Order>> {
        let state = self.state.lock();
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| query.status.as_deref().map_or(true, |s| s == "all" || o.status == s))
            .take(limit)
            .cloned()
            .collect())
    }
}

// =============================================================================
// InMemoryTradeStore
// =============================================================================

#[derive(Default)]
struct StoreState {
    processes: Vec<TweetProcessRecord>,
    queued: Vec<QueuedTradeRecord>,
    executed: Vec<ExecutedTradeRecord>,
    next_id: i64,
    fail_queued: bool,
    fail_executed: HashSet<String>,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// [`TradeStore`] over vectors, with the same guarded transitions as the
/// database repositories.
#[derive(Default)]
pub struct InMemoryTradeStore {
    state: Mutex<StoreState>,
}

impl std::fmt::Debug for InMemoryTradeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTradeStore").finish_non_exhaustive()
    }
}

impl InMemoryTradeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_process(mut self, mut record: TweetProcessRecord) -> Self {
        let state = self.state.get_mut();
        record.id = state.next_id();
        state.processes.push(record);
        self
    }

    #[must_use]
    pub fn fail_queued_inserts(mut self) -> Self {
        self.state.get_mut().fail_queued = true;
        self
    }

    #[must_use]
    /// Executed-trade inserts for `ticker` fail as if the database dropped.
    pub fn fail_executed_inserts_for(mut self, ticker: &str) -> Self {
        self.state.get_mut().fail_executed.insert(ticker.to_uppercase());
        self
    }

    pub fn process(&self, tweet_process_id: &str) -> Option<TweetProcessRecord> {
        self.state
            .lock()
            .processes
            .iter()
            .find(|p| p.tweet_process_id == tweet_process_id)
            .cloned()
    }

    pub fn processes(&self) -> Vec<TweetProcessRecord> {
        self.state.lock().processes.clone()
    }

    pub fn queued(&self) -> Vec<QueuedTradeRecord> {
        self.state.lock().queued.clone()
    }

    pub fn executed(&self) -> Vec<ExecutedTradeRecord> {
        self.state.lock().executed.clone()
    }

    fn transition(
        &self,
        tweet_process_id: &str,
        apply: impl FnOnce(&mut TweetProcessRecord),
    ) -> Transition {
        let mut state = self.state.lock();
        let Some(record) = state
            .processes
            .iter_mut()
            .find(|p| p.tweet_process_id == tweet_process_id)
        else {
            return Transition::NotFound;
        };

        match TweetProcessStatus::parse(&record.status) {
            Some(TweetProcessStatus::Submitted) => {
                apply(record);
                Transition::Applied
            }
            Some(status) => Transition::AlreadyTerminal(status),
            None => Transition::AlreadyTerminal(TweetProcessStatus::Error),
        }
    }
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    async fn create_process(&self, record: &TweetProcessRecord) -> Result<i64, StoreError> {
        let mut state = self.state.lock();
        if state
            .processes
            .iter()
            .any(|p| p.tweet_process_id == record.tweet_process_id)
        {
            return Err(StoreError(format!(
                "duplicate tweet_process_id {}",
                record.tweet_process_id
            )));
        }
        let id = state.next_id();
        let mut record = record.clone();
        record.id = id;
        state.processes.push(record);
        Ok(id)
    }

    async fn complete_process(
        &self,
        tweet_process_id: &str,
        market_effect: Option<bool>,
        trades: Option<&JsonValue>,
        at: DateTime<Utc>,
    ) -> Result<Transition, StoreError> {
        Ok(self.transition(tweet_process_id, |record| {
            record.status = TweetProcessStatus::Completed.as_str().to_string();
            record.market_effect = market_effect;
            record.trades = trades.cloned();
            record.updated_at = at;
            record.completed_at = Some(at);
        }))
    }

    async fn fail_process(
        &self,
        tweet_process_id: &str,
        error_type: Option<&str>,
        error_message: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Transition, StoreError> {
        Ok(self.transition(tweet_process_id, |record| {
            record.status = TweetProcessStatus::Error.as_str().to_string();
            record.error_type = error_type.map(str::to_string);
            record.error_message = error_message.map(str::to_string);
            record.updated_at = at;
            record.completed_at = Some(at);
        }))
    }

    async fn record_queued(&self, trade: &QueuedTradeRecord) -> Result<i64, StoreError> {
        let mut state = self.state.lock();
        if state.fail_queued {
            return Err(StoreError("connection refused".to_string()));
        }
        let id = state.next_id();
        let mut trade = trade.clone();
        trade.id = id;
        state.queued.push(trade);
        Ok(id)
    }

    async fn record_executed(&self, trade: &ExecutedTradeRecord) -> Result<i64, StoreError> {
        let mut state = self.state.lock();
        if state.fail_executed.contains(&trade.ticker.to_uppercase()) {
            return Err(StoreError("connection refused".to_string()));
        }
        let id = state.next_id();
        let mut trade = trade.clone();
        trade.id = id;
        state.executed.push(trade);
        Ok(id)
    }
}
