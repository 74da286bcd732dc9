//! Trade execution for the newsflow engine.
//!
//! This crate provides:
//! - Price lookup, paginated contract listing and contract selection
//! - Order sizing and single-shot order execution
//! - Reconciliation of proposed trades into executed or queued rows
//! - Workflow completion handling with a guarded status transition
//!
//! Brokerage access goes through [`newsflow_alpaca::Brokerage`], persistence
//! through [`TradeStore`], and time through [`newsflow_core::Clock`].

pub mod completion;
pub mod contracts;
pub mod error;
pub mod executor;
pub mod pricing;
pub mod reconcile;
pub mod selector;
pub mod sizing;
pub mod store;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use completion::{CompletionError, CompletionOutcome, WorkflowCompletion};
pub use contracts::ContractFinder;
pub use error::ExecutionError;
pub use executor::{ExecutionReport, ExecutionRequest, OrderExecutor};
pub use pricing::{PriceBasis, PriceLookup};
pub use reconcile::{IntentOutcome, ReconcileSummary, Reconciler};
pub use selector::select_best;
pub use sizing::{option_quantity, stock_notional, CONTRACT_MULTIPLIER};
pub use store::{StoreError, TradeStore};
