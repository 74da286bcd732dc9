//! Turns proposed trades into executed or queued rows.
//!
//! Intents are handled one at a time, in order. A failure on one intent is
//! logged and never stops the rest of the batch.

use std::sync::Arc;

use newsflow_core::{market_clock, Clock, TradeIntent, TradePlan};
use newsflow_data::{ExecutedTradeRecord, QueuedTradeRecord};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::ExecutionError;
use crate::executor::{ExecutionReport, ExecutionRequest, OrderExecutor};
use crate::store::TradeStore;

/// What happened to one intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntentOutcome {
    Executed { ticker: String, symbol: String, order_id: String },
    Queued { ticker: String, reason: Option<String> },
    /// Could not be planned; nothing persisted.
    Rejected { ticker: String, reason: String },
    /// Persisting the outcome failed; nothing persisted.
    Lost { ticker: String, reason: String },
}

/// Per-batch tally, in intent order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileSummary {
    pub outcomes: Vec<IntentOutcome>,
}

impl ReconcileSummary {
    #[must_use]
    pub fn executed(&self) -> usize {
        self.count(|o| matches!(o, IntentOutcome::Executed { .. }))
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.count(|o| matches!(o, IntentOutcome::Queued { .. }))
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, IntentOutcome::Rejected { .. }))
    }

    #[must_use]
    pub fn lost(&self) -> usize {
        self.count(|o| matches!(o, IntentOutcome::Lost { .. }))
    }

    fn count(&self, pred: impl Fn(&IntentOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Executes or queues each intent of a completed analysis run.
#[derive(Clone)]
pub struct Reconciler {
    executor: OrderExecutor,
    store: Arc<dyn TradeStore>,
    clock: Arc<dyn Clock>,
}

impl Reconciler {
    pub fn new(executor: OrderExecutor, store: Arc<dyn TradeStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            executor,
            store,
            clock,
        }
    }

    /// Processes every intent sequentially.
    ///
    /// Market open: attempt execution, queue with the requested parameters
    /// on failure. Market closed: queue without attempting.
    pub async fn reconcile(&self, tweet_process_id: &str, intents: &[TradeIntent]) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        for intent in intents {
            let outcome = self.reconcile_one(tweet_process_id, intent).await;
            summary.outcomes.push(outcome);
        }

        info!(
            tweet_process_id,
            intents = intents.len(),
            executed = summary.executed(),
            queued = summary.queued(),
            rejected = summary.rejected(),
            lost = summary.lost(),
            "Reconciliation finished"
        );
        summary
    }

    async fn reconcile_one(&self, tweet_process_id: &str, intent: &TradeIntent) -> IntentOutcome {
        let now = self.clock.now();
        let plan = match self
            .executor
            .policy()
            .plan(intent, market_clock::trading_date(now))
        {
            Ok(plan) => plan,
            Err(e) => {
                warn!(
                    tweet_process_id,
                    ticker = %intent.ticker,
                    action = %intent.action,
                    error = %e,
                    "Rejecting trade intent"
                );
                return IntentOutcome::Rejected {
                    ticker: intent.ticker.clone(),
                    reason: e.to_string(),
                };
            }
        };

        if !market_clock::is_open(now) {
            info!(tweet_process_id, ticker = %plan.ticker, "Market closed, queueing trade");
            return self.queue(tweet_process_id, &plan, None).await;
        }

        match self.executor.execute(&ExecutionRequest::from_plan(&plan)).await {
            Ok(report) => self.record_execution(tweet_process_id, &plan, &report).await,
            Err(e) => {
                warn!(
                    tweet_process_id,
                    ticker = %plan.ticker,
                    kind = e.kind(),
                    error = %e,
                    "Execution failed, queueing trade"
                );
                self.queue(tweet_process_id, &plan, Some(&e)).await
            }
        }
    }

    async fn queue(
        &self,
        tweet_process_id: &str,
        plan: &TradePlan,
        failure: Option<&ExecutionError>,
    ) -> IntentOutcome {
        let mut record = QueuedTradeRecord::new(
            tweet_process_id,
            &plan.ticker,
            plan.action,
            plan.dollar_amount,
            self.clock.now(),
        )
        .with_reasoning(&plan.reasoning)
        .with_confidence(plan.confidence)
        .with_days_to_hold(plan.days_to_hold.and_then(|d| i32::try_from(d).ok()))
        .with_target_expiry(plan.target_expiry);

        let reason = failure.map(|e| format!("{}: {e}", e.kind()));
        if let Some(reason) = &reason {
            record = record.with_failure_reason(reason);
        }

        match self.store.record_queued(&record).await {
            Ok(id) => {
                info!(tweet_process_id, ticker = %plan.ticker, queued_trade_id = id, "Trade queued");
                IntentOutcome::Queued {
                    ticker: plan.ticker.clone(),
                    reason,
                }
            }
            Err(e) => self.lost(tweet_process_id, plan, "queued", &e.to_string()),
        }
    }

    async fn record_execution(
        &self,
        tweet_process_id: &str,
        plan: &TradePlan,
        report: &ExecutionReport,
    ) -> IntentOutcome {
        let mut record = ExecutedTradeRecord::new(
            tweet_process_id,
            &plan.ticker,
            &report.symbol,
            plan.action,
            &report.order.id,
            report.dollar_amount,
            report.order.filled_at.unwrap_or_else(|| self.clock.now()),
        )
        .with_fill(report.quantity, report.price)
        .with_reasoning(&plan.reasoning)
        .with_days_to_hold(plan.days_to_hold.and_then(|d| i32::try_from(d).ok()));

        if let Some(contract) = &report.contract {
            record = record.with_contract(contract.expiration_date, contract.strike_price);
        }

        match self.store.record_executed(&record).await {
            Ok(id) => {
                info!(
                    tweet_process_id,
                    ticker = %plan.ticker,
                    symbol = %report.symbol,
                    order_id = %report.order.id,
                    executed_trade_id = id,
                    "Trade executed"
                );
                IntentOutcome::Executed {
                    ticker: plan.ticker.clone(),
                    symbol: report.symbol.clone(),
                    order_id: report.order.id.clone(),
                }
            }
            // The order is live; queueing it as well would place it twice.
            Err(e) => self.lost(tweet_process_id, plan, "executed", &e.to_string()),
        }
    }

    fn lost(&self, tweet_process_id: &str, plan: &TradePlan, table: &str, reason: &str) -> IntentOutcome {
        error!(
            tweet_process_id,
            ticker = %plan.ticker,
            action = %plan.action,
            dollar_amount = %plan.dollar_amount,
            target_expiry = ?plan.target_expiry,
            table,
            error = reason,
            "Failed to persist trade outcome; replay manually"
        );
        IntentOutcome::Lost {
            ticker: plan.ticker.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{closed_clock, open_clock, InMemoryTradeStore, MockBrokerage};
    use newsflow_core::{FixedClock, TradeAction, TradingPolicy};
    use rust_decimal_macros::dec;

    fn reconciler(
        broker: &Arc<MockBrokerage>,
        store: &Arc<InMemoryTradeStore>,
        clock: FixedClock,
    ) -> Reconciler {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        let executor = OrderExecutor::new(broker.clone(), clock.clone(), TradingPolicy::default());
        Reconciler::new(executor, store.clone(), clock)
    }

    fn three_intents() -> Vec<TradeIntent> {
        vec![
            TradeIntent::new("AAPL", TradeAction::Buy).with_confidence(0.9),
            TradeIntent::new("TSLA", TradeAction::Sell).with_confidence(0.5),
            TradeIntent::new("MSFT", TradeAction::Buy).with_confidence(0.7),
        ]
    }

    #[tokio::test]
    async fn test_middle_failure_is_queued_and_batch_continues() {
        let broker = Arc::new(MockBrokerage::new().fail_submit_for("TSLA"));
        let store = Arc::new(InMemoryTradeStore::new());
        let summary = reconciler(&broker, &store, open_clock())
            .reconcile("tp-1", &three_intents())
            .await;

        assert_eq!(summary.executed(), 2);
        assert_eq!(summary.queued(), 1);
        assert_eq!(broker.submitted_orders().len(), 3);

        let executed = store.executed();
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[0].ticker, "AAPL");
        assert_eq!(executed[1].ticker, "MSFT");

        let queued = store.queued();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].ticker, "TSLA");
        assert_eq!(queued[0].action, "sell");
        assert_eq!(queued[0].dollar_amount, dec!(500));
        assert!(queued[0]
            .failure_reason
            .as_deref()
            .unwrap()
            .starts_with("brokerage"));
    }

    #[tokio::test]
    async fn test_market_closed_queues_everything_without_submitting() {
        let broker = Arc::new(MockBrokerage::new());
        let store = Arc::new(InMemoryTradeStore::new());
        let summary = reconciler(&broker, &store, closed_clock())
            .reconcile("tp-2", &three_intents())
            .await;

        assert_eq!(summary.queued(), 3);
        assert!(broker.submitted_orders().is_empty());
        assert!(store.executed().is_empty());
        assert_eq!(store.queued().len(), 3);
        assert!(store.queued().iter().all(|q| q.failure_reason.is_none()));
    }

    #[tokio::test]
    async fn test_executed_row_uses_selected_contract() {
        let broker = Arc::new(MockBrokerage::with_option_chain(
            "NVDA",
            dec!(120),
            dec!(2.50),
        ));
        let store = Arc::new(InMemoryTradeStore::new());
        let intents = vec![TradeIntent::new("nvda", TradeAction::Call)
            .with_confidence(1.0)
            .with_reasoning("data center beat")];

        let summary = reconciler(&broker, &store, open_clock())
            .reconcile("tp-3", &intents)
            .await;
        assert_eq!(summary.executed(), 1);

        let executed = &store.executed()[0];
        let submitted = &broker.submitted_orders()[0];
        assert_eq!(executed.symbol, submitted.symbol);
        assert_ne!(executed.symbol, "NVDA");
        assert_eq!(executed.ticker, "NVDA");
        assert_eq!(executed.instrument, "option");
        assert!(executed.expiry_date.is_some());
        assert!(executed.strike_price.is_some());
        // floor(1000 / 250) = 4 contracts at 2.50
        assert_eq!(executed.quantity, Some(dec!(4)));
        assert_eq!(executed.dollar_amount, dec!(1000));
        assert_eq!(executed.reasoning, "data center beat");
    }

    #[tokio::test]
    async fn test_option_failure_queues_requested_expiry() {
        // No contracts listed: selection fails and the request is queued.
        let broker = Arc::new(MockBrokerage::new().with_last_trade("AMD", dec!(150)));
        let store = Arc::new(InMemoryTradeStore::new());
        let clock = open_clock();
        let intents = vec![TradeIntent::new("AMD", TradeAction::Put).with_timeline_days(90)];

        let summary = reconciler(&broker, &store, clock).reconcile("tp-4", &intents).await;
        assert_eq!(summary.queued(), 1);

        let queued = &store.queued()[0];
        let expected = market_clock::trading_date(clock.0) + chrono::Duration::days(180);
        assert_eq!(queued.target_expiry_date, Some(expected));
        assert_eq!(queued.instrument, "option");
        assert!(queued
            .failure_reason
            .as_deref()
            .unwrap()
            .starts_with("no_contracts_available"));
    }

    #[tokio::test]
    async fn test_unplannable_intent_is_rejected_not_persisted() {
        let broker = Arc::new(MockBrokerage::new());
        let store = Arc::new(InMemoryTradeStore::new());
        let intents = vec![
            TradeIntent::new("  ", TradeAction::Buy),
            TradeIntent::new("AAPL", TradeAction::Buy).with_confidence(0.0),
            TradeIntent::new("GOOG", TradeAction::Buy),
        ];

        let summary = reconciler(&broker, &store, open_clock())
            .reconcile("tp-5", &intents)
            .await;

        assert_eq!(summary.rejected(), 2);
        assert_eq!(summary.executed(), 1);
        assert_eq!(store.executed().len(), 1);
        assert!(store.queued().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_terminal_for_that_intent_only() {
        let broker = Arc::new(MockBrokerage::new());
        let store = Arc::new(InMemoryTradeStore::new().fail_queued_inserts());
        let summary = reconciler(&broker, &store, closed_clock())
            .reconcile("tp-6", &three_intents())
            .await;

        assert_eq!(summary.lost(), 3);
        assert_eq!(summary.outcomes.len(), 3);
        assert!(broker.submitted_orders().is_empty());
    }

    #[tokio::test]
    async fn test_failed_executed_insert_is_lost_not_queued() {
        let broker = Arc::new(MockBrokerage::new());
        let store = Arc::new(InMemoryTradeStore::new().fail_executed_inserts_for("AAPL"));
        let intents = vec![
            TradeIntent::new("AAPL", TradeAction::Buy).with_confidence(0.9),
            TradeIntent::new("MSFT", TradeAction::Buy).with_confidence(0.7),
        ];
        let summary = reconciler(&broker, &store, open_clock())
            .reconcile("tp-7", &intents)
            .await;

        assert_eq!(summary.lost(), 1);
        assert_eq!(summary.executed(), 1);
        assert!(matches!(
            &summary.outcomes[0],
            IntentOutcome::Lost { ticker, .. } if ticker == "AAPL"
        ));

        let submitted = broker.submitted_orders();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted.iter().filter(|o| o.symbol == "AAPL").count(), 1);

        assert!(store.queued().is_empty());
        let executed = store.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].ticker, "MSFT");
    }
}
