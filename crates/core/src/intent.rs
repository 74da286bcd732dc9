//! Trade intents produced by the analysis workflow.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What the workflow wants done with a ticker.
///
/// `Buy`/`Sell` trade the stock itself; `Call`/`Put` buy an options
/// contract of that type on the ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TradeAction {
    Buy,
    Sell,
    Call,
    Put,
}

impl TradeAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Call => "call",
            Self::Put => "put",
        }
    }

    /// The instrument this action trades.
    #[must_use]
    pub fn instrument(&self) -> InstrumentKind {
        match self {
            Self::Buy | Self::Sell => InstrumentKind::Stock,
            Self::Call | Self::Put => InstrumentKind::Option,
        }
    }

    /// Contract type for option actions.
    #[must_use]
    pub fn option_right(&self) -> Option<OptionRight> {
        match self {
            Self::Call => Some(OptionRight::Call),
            Self::Put => Some(OptionRight::Put),
            Self::Buy | Self::Sell => None,
        }
    }
}

impl FromStr for TradeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "long" => Ok(Self::Buy),
            "sell" | "short" => Ok(Self::Sell),
            "call" => Ok(Self::Call),
            "put" => Ok(Self::Put),
            other => Err(format!("unknown trade action: {other:?}")),
        }
    }
}

impl TryFrom<String> for TradeAction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl OptionRight {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock or options contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Stock,
    Option,
}

impl InstrumentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Option => "option",
        }
    }
}

/// A single proposed trade from the workflow. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub ticker: String,
    #[serde(alias = "position")]
    pub action: TradeAction,
    /// Conviction in [0, 1].
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, alias = "days_to_hold", alias = "timeline")]
    pub timeline_days: Option<i64>,
    #[serde(default)]
    pub reasoning: String,
}

impl TradeIntent {
    #[must_use]
    pub fn new(ticker: impl Into<String>, action: TradeAction) -> Self {
        Self {
            ticker: ticker.into(),
            action,
            confidence: None,
            timeline_days: None,
            reasoning: String::new(),
        }
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    #[must_use]
    pub fn with_timeline_days(mut self, days: i64) -> Self {
        self.timeline_days = Some(days);
        self
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}
