//! Turns trade intents into concrete sizing and expiry targets.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TradingPolicy;
use crate::intent::{InstrumentKind, TradeAction, TradeIntent};

/// Sizing and target dates derived from one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    /// Upper-cased underlying ticker.
    pub ticker: String,
    pub action: TradeAction,
    pub dollar_amount: Decimal,
    /// Holding period for stock trades.
    pub days_to_hold: Option<i64>,
    /// Desired contract expiry for option trades.
    pub target_expiry: Option<NaiveDate>,
    pub confidence: Option<f64>,
    pub reasoning: String,
}

impl TradePlan {
    #[must_use]
    pub fn instrument(&self) -> InstrumentKind {
        self.action.instrument()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("ticker is empty")]
    EmptyTicker,

    #[error("confidence {0} is not a finite number")]
    InvalidConfidence(f64),

    #[error("dollar amount {0} is not positive")]
    NonPositiveAmount(Decimal),
}

impl TradingPolicy {
    /// Computes the plan for an intent received on `today`.
    ///
    /// # Errors
    /// Returns an error for an empty ticker, a non-finite confidence, or a
    /// resulting dollar amount that is zero or negative.
    pub fn plan(&self, intent: &TradeIntent, today: NaiveDate) -> Result<TradePlan, PlanError> {
        let ticker = intent.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(PlanError::EmptyTicker);
        }

        let dollar_amount = self.dollar_amount(intent.confidence)?;
        if dollar_amount <= Decimal::ZERO {
            return Err(PlanError::NonPositiveAmount(dollar_amount));
        }

        let (days_to_hold, target_expiry) = match intent.action.instrument() {
            InstrumentKind::Stock => (intent.timeline_days, None),
            InstrumentKind::Option => (None, Some(self.target_expiry(intent.timeline_days, today))),
        };

        Ok(TradePlan {
            ticker,
            action: intent.action,
            dollar_amount,
            days_to_hold,
            target_expiry,
            confidence: intent.confidence,
            reasoning: intent.reasoning.clone(),
        })
    }

    /// Dollar budget for a trade at the given confidence.
    ///
    /// A fixed notional wins over confidence scaling. Missing confidence
    /// counts as full confidence; out-of-range values are clamped to [0, 1].
    ///
    /// # Errors
    /// Returns an error if the confidence is NaN or infinite.
    pub fn dollar_amount(&self, confidence: Option<f64>) -> Result<Decimal, PlanError> {
        if let Some(fixed) = self.fixed_notional {
            return Ok(fixed.round_dp(2));
        }

        let confidence = match confidence {
            None => Decimal::ONE,
            Some(c) if !c.is_finite() => return Err(PlanError::InvalidConfidence(c)),
            Some(c) => Decimal::try_from(c.clamp(0.0, 1.0))
                .map_err(|_| PlanError::InvalidConfidence(c))?,
        };

        Ok((self.base_dollar_amount * confidence).round_dp(2))
    }

    /// Target option expiry: short horizon unless the timeline is long.
    #[must_use]
    pub fn target_expiry(&self, timeline_days: Option<i64>, today: NaiveDate) -> NaiveDate {
        let offset = match timeline_days {
            Some(days) if days > self.long_horizon_threshold_days => self.long_horizon_days,
            _ => self.short_horizon_days,
        };
        today + Duration::days(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 11).unwrap()
    }

    #[test]
    fn test_stock_plan_scales_by_confidence() {
        let policy = TradingPolicy::default();
        let intent = TradeIntent::new(" aapl ", TradeAction::Buy)
            .with_confidence(0.75)
            .with_timeline_days(5);

        let plan = policy.plan(&intent, today()).unwrap();
        assert_eq!(plan.ticker, "AAPL");
        assert_eq!(plan.dollar_amount, dec!(750));
        assert_eq!(plan.days_to_hold, Some(5));
        assert_eq!(plan.target_expiry, None);
    }

    #[test]
    fn test_fixed_notional_ignores_confidence() {
        let policy = TradingPolicy {
            fixed_notional: Some(dec!(500)),
            ..TradingPolicy::default()
        };
        let intent = TradeIntent::new("MSFT", TradeAction::Sell).with_confidence(0.1);
        assert_eq!(policy.plan(&intent, today()).unwrap().dollar_amount, dec!(500));
    }

    #[test]
    fn test_missing_confidence_uses_base_amount() {
        let policy = TradingPolicy::default();
        assert_eq!(policy.dollar_amount(None).unwrap(), dec!(1000));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let policy = TradingPolicy::default();
        assert_eq!(policy.dollar_amount(Some(3.0)).unwrap(), dec!(1000));
        assert!(policy.dollar_amount(Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_zero_confidence_is_rejected() {
        let policy = TradingPolicy::default();
        let intent = TradeIntent::new("AMD", TradeAction::Buy).with_confidence(0.0);
        assert!(matches!(
            policy.plan(&intent, today()),
            Err(PlanError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_empty_ticker_is_rejected() {
        let policy = TradingPolicy::default();
        let intent = TradeIntent::new("   ", TradeAction::Buy);
        assert_eq!(policy.plan(&intent, today()), Err(PlanError::EmptyTicker));
    }

    #[test]
    fn test_option_short_horizon_expiry() {
        let policy = TradingPolicy::default();
        let intent = TradeIntent::new("NVDA", TradeAction::Call).with_timeline_days(10);
        let plan = policy.plan(&intent, today()).unwrap();
        assert_eq!(plan.target_expiry, Some(today() + Duration::days(30)));
        assert_eq!(plan.days_to_hold, None);
    }

    #[test]
    fn test_option_long_horizon_expiry() {
        let policy = TradingPolicy::default();
        let intent = TradeIntent::new("NVDA", TradeAction::Put).with_timeline_days(90);
        let plan = policy.plan(&intent, today()).unwrap();
        assert_eq!(plan.target_expiry, Some(today() + Duration::days(180)));
    }

    #[test]
    fn test_threshold_boundary_is_short_horizon() {
        let policy = TradingPolicy::default();
        assert_eq!(
            policy.target_expiry(Some(30), today()),
            today() + Duration::days(30)
        );
        assert_eq!(policy.target_expiry(None, today()), today() + Duration::days(30));
    }
}
