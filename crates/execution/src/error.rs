//! Error taxonomy for order execution.

use newsflow_alpaca::AlpacaError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Why an order attempt did not produce an order.
///
/// Every variant aborts only the attempt in hand; reconciliation turns any
/// of them into a queued trade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// Bad input, closed market, or missing credentials. Nothing was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No positive price could be obtained.
    #[error("price unavailable for {symbol}: {reason}")]
    PriceUnavailable { symbol: String, reason: String },

    /// A contracts page request failed; partial results are discarded.
    #[error("failed to fetch contracts for {symbol}: {reason}")]
    ContractFetch { symbol: String, reason: String },

    #[error("no options contracts available")]
    NoContractsAvailable,

    /// Budget buys less than one contract.
    #[error("budget {budget} too small for contract price {price}")]
    BudgetTooSmall { budget: Decimal, price: Decimal },

    /// Structured rejection from the brokerage.
    #[error("brokerage error: {status_code} - {message}")]
    Brokerage { status_code: u16, message: String },

    /// Submission failed without a structured brokerage error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExecutionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn price_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PriceUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn contract_fetch(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContractFetch {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable tag for log fields and stored failure reasons.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::PriceUnavailable { .. } => "price_unavailable",
            Self::ContractFetch { .. } => "contract_fetch",
            Self::NoContractsAvailable => "no_contracts_available",
            Self::BudgetTooSmall { .. } => "budget_too_small",
            Self::Brokerage { .. } => "brokerage",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status to report when this error reaches an API caller.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::BudgetTooSmall { .. } => 400,
            Self::NoContractsAvailable => 404,
            Self::PriceUnavailable { .. } | Self::ContractFetch { .. } => 502,
            Self::Brokerage { status_code, .. } => *status_code,
            Self::Internal(_) => 500,
        }
    }
}

/// Maps an order-submission failure.
impl From<AlpacaError> for ExecutionError {
    fn from(err: AlpacaError) -> Self {
        match err {
            AlpacaError::Api {
                status_code,
                message,
            } => Self::Brokerage {
                status_code,
                message,
            },
            AlpacaError::Configuration(msg) | AlpacaError::InvalidRequest(msg) => {
                Self::Validation(msg)
            }
            other => Self::Internal(other.to_string()),
        }
    }
}
