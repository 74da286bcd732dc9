//! Shared handler state.

use std::sync::Arc;

use anyhow::Context;
use newsflow_alpaca::{AlpacaClient, Brokerage};
use newsflow_core::{AppConfig, Clock, SystemClock, TradingPolicy};
use newsflow_data::Repositories;
use newsflow_execution::{OrderExecutor, Reconciler, TradeStore, WorkflowCompletion};

use crate::trigger::WorkflowTrigger;

/// Everything the handlers reach for. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Read side for dashboard listings.
    pub repos: Repositories,
    /// Write side used by the webhook and trigger handlers.
    pub store: Arc<dyn TradeStore>,
    pub broker: Arc<dyn Brokerage>,
    pub clock: Arc<dyn Clock>,
    pub executor: OrderExecutor,
    pub completion: WorkflowCompletion,
    pub trigger: WorkflowTrigger,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        store: Arc<dyn TradeStore>,
        broker: Arc<dyn Brokerage>,
        clock: Arc<dyn Clock>,
        policy: TradingPolicy,
        trigger: WorkflowTrigger,
    ) -> Self {
        let executor = OrderExecutor::new(broker.clone(), clock.clone(), policy);
        let reconciler = Reconciler::new(executor.clone(), store.clone(), clock.clone());
        let completion = WorkflowCompletion::new(store.clone(), reconciler, clock.clone());
        Self {
            repos,
            store,
            broker,
            clock,
            executor,
            completion,
            trigger,
        }
    }

    /// Production wiring: Alpaca, Postgres repositories and the wall clock.
    ///
    /// # Errors
    /// Returns an error if brokerage credentials are missing or an HTTP
    /// client cannot be built.
    pub fn from_config(config: &AppConfig, repos: Repositories) -> anyhow::Result<Self> {
        let broker = AlpacaClient::new(&config.brokerage).context("brokerage client")?;
        let trigger = WorkflowTrigger::new(&config.workflow).context("workflow client")?;
        Ok(Self::new(
            repos.clone(),
            Arc::new(repos),
            Arc::new(broker),
            Arc::new(SystemClock),
            config.trading.clone(),
            trigger,
        ))
    }
}
