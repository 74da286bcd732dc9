//! Order sizing.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::ExecutionError;

/// Underlying units per options contract.
pub const CONTRACT_MULTIPLIER: Decimal = Decimal::ONE_HUNDRED;

/// Whole contracts affordable with `budget`:
/// `floor(budget / (contract_price * 100))`.
///
/// # Errors
/// Returns [`ExecutionError::BudgetTooSmall`] when the price is not positive
/// or the budget buys zero contracts, and [`ExecutionError::Validation`]
/// when the quantity does not fit an order.
pub fn option_quantity(budget: Decimal, contract_price: Decimal) -> Result<u32, ExecutionError> {
    let too_small = || ExecutionError::BudgetTooSmall {
        budget,
        price: contract_price,
    };
    let oversized = || {
        ExecutionError::validation(format!(
            "budget {budget} at contract price {contract_price} exceeds the maximum order quantity"
        ))
    };

    if contract_price <= Decimal::ZERO {
        return Err(too_small());
    }

    let quantity = contract_price
        .checked_mul(CONTRACT_MULTIPLIER)
        .and_then(|cost_per_contract| budget.checked_div(cost_per_contract))
        .ok_or_else(oversized)?
        .floor();

    if quantity < Decimal::ONE {
        return Err(too_small());
    }
    quantity.to_u32().ok_or_else(oversized)
}

/// Dollar amount for a notional stock order. Passed through unchanged; the
/// brokerage handles fractional shares.
///
/// # Errors
/// Returns [`ExecutionError::Validation`] for a non-positive amount.
pub fn stock_notional(amount: Decimal) -> Result<Decimal, ExecutionError> {
    if amount <= Decimal::ZERO {
        return Err(ExecutionError::validation(format!(
            "dollar amount must be positive, got {amount}"
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_budget_below_one_contract_fails() {
        let err = option_quantity(dec!(1000), dec!(12.50)).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::BudgetTooSmall {
                budget: dec!(1000),
                price: dec!(12.50)
            }
        );
    }

    #[test]
    fn test_quantity_is_floored() {
        assert_eq!(option_quantity(dec!(5000), dec!(12.50)).unwrap(), 4);
        assert_eq!(option_quantity(dec!(5999.99), dec!(12.50)).unwrap(), 4);
        assert_eq!(option_quantity(dec!(1250), dec!(12.50)).unwrap(), 1);
    }

    #[test]
    fn test_non_positive_price_fails() {
        assert!(matches!(
            option_quantity(dec!(5000), Decimal::ZERO),
            Err(ExecutionError::BudgetTooSmall { .. })
        ));
        assert!(matches!(
            option_quantity(dec!(5000), dec!(-2)),
            Err(ExecutionError::BudgetTooSmall { .. })
        ));
    }

    #[test]
    fn test_quantity_beyond_order_range_is_validation_error() {
        assert!(matches!(
            option_quantity(dec!(1_000_000_000_000), dec!(0.01)),
            Err(ExecutionError::Validation(_))
        ));
        assert!(matches!(
            option_quantity(Decimal::MAX, dec!(0.0001)),
            Err(ExecutionError::Validation(_))
        ));
    }

    #[test]
    fn test_stock_notional_passes_through() {
        assert_eq!(stock_notional(dec!(437.25)).unwrap(), dec!(437.25));
        assert!(matches!(
            stock_notional(Decimal::ZERO),
            Err(ExecutionError::Validation(_))
        ));
    }
}
