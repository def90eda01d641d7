//! Balance arithmetic for a single movement.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::MovementKind;

/// Why a movement cannot be applied to a balance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("movement quantity must be greater than 0")]
    NonPositiveQuantity,

    #[error("insufficient stock: {available} available")]
    InsufficientStock { available: Decimal },
}

/// Compute the balance after applying one movement to `current`.
///
/// This is the decision function of the movement coordinator: a `Decrease`
/// that would drive the balance below zero is rejected, carrying the balance
/// that was actually available. Decreasing to exactly zero is allowed.
pub fn next_balance(
    current: Decimal,
    kind: MovementKind,
    quantity: Decimal,
) -> Result<Decimal, BalanceError> {
    if quantity <= Decimal::ZERO {
        return Err(BalanceError::NonPositiveQuantity);
    }

    let next = current + kind.signed(quantity);
    if kind == MovementKind::Decrease && next < Decimal::ZERO {
        return Err(BalanceError::InsufficientStock { available: current });
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn increase_adds() {
        assert_eq!(
            next_balance(dec(10), MovementKind::Increase, dec(4)),
            Ok(dec(14))
        );
    }

    #[test]
    fn decrease_subtracts() {
        assert_eq!(
            next_balance(dec(10), MovementKind::Decrease, dec(4)),
            Ok(dec(6))
        );
    }

    #[test]
    fn decrease_to_zero_is_allowed() {
        assert_eq!(
            next_balance(dec(10), MovementKind::Decrease, dec(10)),
            Ok(Decimal::ZERO)
        );
    }

    #[test]
    fn overdraw_reports_available() {
        assert_eq!(
            next_balance(dec(6), MovementKind::Decrease, dec(100)),
            Err(BalanceError::InsufficientStock { available: dec(6) })
        );
    }

    #[test]
    fn non_positive_quantity_rejected() {
        assert_eq!(
            next_balance(dec(10), MovementKind::Increase, Decimal::ZERO),
            Err(BalanceError::NonPositiveQuantity)
        );
        assert_eq!(
            next_balance(dec(10), MovementKind::Decrease, dec(-3)),
            Err(BalanceError::NonPositiveQuantity)
        );
    }
}
