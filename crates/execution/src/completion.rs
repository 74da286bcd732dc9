//! Workflow completion callback: one guarded status transition, then
//! reconciliation of any proposed trades.

use std::sync::Arc;

use newsflow_core::{decode_workflow_result, Clock, WebhookError, WorkflowStatus};
use newsflow_data::{Transition, TweetProcessStatus};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::reconcile::{ReconcileSummary, Reconciler};
use crate::store::{StoreError, TradeStore};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error(transparent)]
    InvalidPayload(#[from] WebhookError),

    #[error("tweet process {0} not found")]
    NotFound(String),

    #[error("tweet process {tweet_process_id} already {}", status.as_str())]
    Conflict {
        tweet_process_id: String,
        status: TweetProcessStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CompletionError {
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidPayload(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict { .. } => 409,
            Self::Store(_) => 500,
        }
    }
}

/// Result of a successfully applied completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    pub tweet_process_id: String,
    pub status: &'static str,
    pub market_effect: Option<bool>,
    /// Present only when trades were reconciled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<ReconcileSummary>,
}

/// Applies workflow results to their analysis runs.
#[derive(Clone)]
pub struct WorkflowCompletion {
    store: Arc<dyn TradeStore>,
    reconciler: Reconciler,
    clock: Arc<dyn Clock>,
}

impl WorkflowCompletion {
    pub fn new(store: Arc<dyn TradeStore>, reconciler: Reconciler, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            reconciler,
            clock,
        }
    }

    /// Decodes `raw` and applies it.
    ///
    /// Reconciliation failures are logged per trade and never surface here.
    ///
    /// # Errors
    /// - `InvalidPayload` - body cannot be decoded
    /// - `NotFound` - no run with that ID
    /// - `Conflict` - run already left `submitted`
    /// - `Store` - the status update itself failed
    pub async fn complete(&self, raw: &str) -> Result<CompletionOutcome, CompletionError> {
        let result = decode_workflow_result(raw)?;
        let id = result.tweet_process_id.as_str();
        let now = self.clock.now();

        if result.status == WorkflowStatus::Error {
            let transition = self
                .store
                .fail_process(
                    id,
                    result.error_type.as_deref(),
                    result.error_message.as_deref(),
                    now,
                )
                .await?;
            check(id, transition)?;
            warn!(
                tweet_process_id = id,
                error_type = ?result.error_type,
                error_message = ?result.error_message,
                "Workflow reported an error"
            );
            return Ok(CompletionOutcome {
                tweet_process_id: id.to_string(),
                status: TweetProcessStatus::Error.as_str(),
                market_effect: None,
                reconciliation: None,
            });
        }

        if !result.is_actionable() {
            let transition = self
                .store
                .complete_process(id, result.market_effect, None, now)
                .await?;
            check(id, transition)?;
            info!(tweet_process_id = id, market_effect = ?result.market_effect, "No market effect");
            return Ok(CompletionOutcome {
                tweet_process_id: id.to_string(),
                status: TweetProcessStatus::Completed.as_str(),
                market_effect: result.market_effect,
                reconciliation: None,
            });
        }

        let snapshot = serde_json::to_value(&result.trades)
            .map_err(|e| StoreError(format!("serializing trades: {e}")))?;
        let transition = self
            .store
            .complete_process(id, Some(true), Some(&snapshot), now)
            .await?;
        check(id, transition)?;
        info!(tweet_process_id = id, trades = result.trades.len(), "Market-moving post");

        let summary = self.reconciler.reconcile(id, &result.trades).await;
        Ok(CompletionOutcome {
            tweet_process_id: id.to_string(),
            status: TweetProcessStatus::Completed.as_str(),
            market_effect: Some(true),
            reconciliation: Some(summary),
        })
    }
}

fn check(tweet_process_id: &str, transition: Transition) -> Result<(), CompletionError> {
    match transition {
        Transition::Applied => Ok(()),
        Transition::NotFound => Err(CompletionError::NotFound(tweet_process_id.to_string())),
        Transition::AlreadyTerminal(status) => {
            warn!(tweet_process_id, status = status.as_str(), "Duplicate completion ignored");
            Err(CompletionError::Conflict {
                tweet_process_id: tweet_process_id.to_string(),
                status,
            })
        }
    }
}
