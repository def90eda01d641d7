//! Ledger replay: reconstruct running balances from the movement history.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::StockMovement;

/// One kardex line: a movement and the balance immediately after it.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerLine {
    #[serde(flatten)]
    pub movement: StockMovement,
    pub balance: Decimal,
}

/// Replay `movements` (already in ledger order) from `initial_quantity`,
/// producing the running balance after each movement.
///
/// Pure and total. A `Decrease` larger than the running balance still
/// produces a line with a negative balance: the coordinator prevents such a
/// movement from ever being committed, so a negative balance here is a
/// corruption signal, not a normal state.
pub fn reconstruct(initial_quantity: Decimal, movements: &[StockMovement]) -> Vec<LedgerLine> {
    let mut balance = initial_quantity;
    movements
        .iter()
        .map(|movement| {
            balance += movement.signed_quantity();
            LedgerLine {
                movement: movement.clone(),
                balance,
            }
        })
        .collect()
}

/// Result of checking the cached item quantity against a full replay.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerAudit {
    /// Running balances in ledger order.
    pub lines: Vec<LedgerLine>,
    /// Final balance produced by the replay.
    pub computed_quantity: Decimal,
    /// The item's cached `quantity` at read time.
    pub cached_quantity: Decimal,
    /// False signals a corrupted ledger: an out-of-band write to the cached
    /// quantity, or a lost/duplicated movement. Surfaced to operators, never
    /// auto-corrected.
    pub consistent: bool,
}

/// Replay the full ledger and compare the result against the cached quantity.
pub fn audit(
    initial_quantity: Decimal,
    movements: &[StockMovement],
    cached_quantity: Decimal,
) -> LedgerAudit {
    let lines = reconstruct(initial_quantity, movements);
    let computed_quantity = lines.last().map_or(initial_quantity, |line| line.balance);
    LedgerAudit {
        consistent: computed_quantity == cached_quantity,
        computed_quantity,
        cached_quantity,
        lines,
    }
}
