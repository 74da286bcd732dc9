//! Picks one options contract from a candidate list.
//!
//! Two independent stages: a strike window around the current price, then
//! an ordering by expiry distance with strike distance as the tie-break.
//! They are not blended into a single score.

use chrono::NaiveDate;
use newsflow_alpaca::OptionContract;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ExecutionError;

/// Largest relative strike distance kept by the first stage.
pub const MAX_STRIKE_DISTANCE: Decimal = dec!(0.25);

/// Selects the best contract for a target expiry and underlying price.
///
/// Contracts whose strike is within 25% of `current_price` are kept; if none
/// are, all contracts are considered. Candidates are stably sorted by
/// `|expiration - target|` then `|strike - current_price|`, so among exact
/// ties the earlier input wins.
///
/// # Errors
/// Returns [`ExecutionError::NoContractsAvailable`] for an empty list.
pub fn select_best(
    contracts: &[OptionContract],
    target_expiration: NaiveDate,
    current_price: Decimal,
) -> Result<OptionContract, ExecutionError> {
    if contracts.is_empty() {
        return Err(ExecutionError::NoContractsAvailable);
    }

    let near: Vec<&OptionContract> = contracts
        .iter()
        .filter(|c| within_strike_window(c.strike_price, current_price))
        .collect();

    let mut candidates = if near.is_empty() {
        contracts.iter().collect()
    } else {
        near
    };

    candidates.sort_by_key(|c| {
        (
            (c.expiration_date - target_expiration).num_days().abs(),
            (c.strike_price - current_price).abs(),
        )
    });

    candidates
        .first()
        .map(|c| (*c).clone())
        .ok_or(ExecutionError::NoContractsAvailable)
}

fn within_strike_window(strike: Decimal, current_price: Decimal) -> bool {
    if current_price <= Decimal::ZERO {
        return false;
    }
    (strike - current_price).abs() / current_price <= MAX_STRIKE_DISTANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::contract;
    use chrono::Duration;
    use newsflow_core::OptionRight;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(n)
    }

    fn at(expiry_day: i64, strike: Decimal) -> OptionContract {
        contract("XYZ", day(expiry_day), strike, OptionRight::Call)
    }

    #[test]
    fn test_empty_list_fails() {
        let err = select_best(&[], day(30), dec!(100)).unwrap_err();
        assert_eq!(err, ExecutionError::NoContractsAvailable);
    }

    #[test]
    fn test_equidistant_strikes_keep_input_order() {
        let contracts = vec![
            at(30, dec!(70)),
            at(30, dec!(90)),
            at(30, dec!(110)),
            at(30, dec!(130)),
        ];

        let best = select_best(&contracts, day(30), dec!(100)).unwrap();
        assert_eq!(best.strike_price, dec!(90));

        let reversed: Vec<_> = contracts.into_iter().rev().collect();
        let best = select_best(&reversed, day(30), dec!(100)).unwrap();
        assert_eq!(best.strike_price, dec!(110));
    }

    #[test]
    fn test_strike_filter_runs_before_date_ordering() {
        // Day 25 is closer to the target but its strike is 100% away.
        let contracts = vec![at(25, dec!(200)), at(60, dec!(95))];

        let best = select_best(&contracts, day(30), dec!(100)).unwrap();
        assert_eq!(best.expiration_date, day(60));
        assert_eq!(best.strike_price, dec!(95));
    }

    #[test]
    fn test_falls_back_to_all_contracts_when_none_are_near() {
        // Both outside the window: date proximity decides alone.
        let contracts = vec![at(40, dec!(60)), at(30, dec!(140))];

        let best = select_best(&contracts, day(30), dec!(100)).unwrap();
        assert_eq!(best.expiration_date, day(30));
        assert_eq!(best.strike_price, dec!(140));
    }

    #[test]
    fn test_date_beats_strike_among_survivors() {
        // Exact date 20% away wins over 1% away but 10 days off.
        let contracts = vec![at(40, dec!(101)), at(30, dec!(120))];

        let best = select_best(&contracts, day(30), dec!(100)).unwrap();
        assert_eq!(best.strike_price, dec!(120));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let contracts = vec![at(30, dec!(125)), at(31, dec!(100))];

        let best = select_best(&contracts, day(30), dec!(100)).unwrap();
        assert_eq!(best.strike_price, dec!(125));
    }

    #[test]
    fn test_expiry_before_target_counts_by_absolute_distance() {
        let contracts = vec![at(35, dec!(100)), at(27, dec!(100))];

        let best = select_best(&contracts, day(30), dec!(100)).unwrap();
        assert_eq!(best.expiration_date, day(27));
    }
}
