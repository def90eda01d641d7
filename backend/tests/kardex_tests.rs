//! Kardex ledger tests
//!
//! Tests for the stock ledger core including:
//! - Balance identity: cached quantity equals initial quantity plus the
//!   signed movement history
//! - Non-negativity: no sequence of operations drives stock below zero
//! - Replay determinism and integrity auditing
//! - Optimistic-concurrency semantics of the movement coordinator

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::kardex::{audit, next_balance, reconstruct, BalanceError};
use shared::models::{MovementKind, StockMovement};
use shared::types::WorkOrderRef;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// Helper to create a committed movement at a given ledger position
fn movement(seq: i64, kind: MovementKind, quantity: Decimal) -> StockMovement {
    StockMovement {
        id: Uuid::new_v4(),
        seq,
        item_id: Uuid::nil(),
        company_id: Uuid::nil(),
        kind,
        quantity,
        notes: None,
        attachments: Vec::new(),
        work_order: None,
        created_by: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
            + chrono::Duration::minutes(seq),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Walk the genesis scenario: empty item, stock in, consumption against
    /// a work order, then an overdraw attempt that must change nothing.
    #[test]
    fn test_genesis_scenario() {
        let mut quantity = Decimal::ZERO;
        let mut ledger: Vec<StockMovement> = Vec::new();

        // increase(10)
        quantity = next_balance(quantity, MovementKind::Increase, dec("10")).unwrap();
        ledger.push(movement(1, MovementKind::Increase, dec("10")));
        assert_eq!(quantity, dec("10"));

        // decrease(4) tied to a work order
        quantity = next_balance(quantity, MovementKind::Decrease, dec("4")).unwrap();
        let mut consumption = movement(2, MovementKind::Decrease, dec("4"));
        consumption.work_order = Some(WorkOrderRef {
            id: Uuid::new_v4(),
            display_code: "OS-2024-0042".to_string(),
        });
        ledger.push(consumption);
        assert_eq!(quantity, dec("6"));

        // decrease(100) must be rejected and leave no trace
        let result = next_balance(quantity, MovementKind::Decrease, dec("100"));
        assert_eq!(
            result,
            Err(BalanceError::InsufficientStock {
                available: dec("6")
            })
        );
        assert_eq!(quantity, dec("6"));
        assert_eq!(ledger.len(), 2);

        // The replayed kardex agrees with the cached quantity and carries
        // the work-order reference on the consumption line.
        let audit = audit(Decimal::ZERO, &ledger, quantity);
        assert!(audit.consistent);
        let balances: Vec<Decimal> = audit.lines.iter().map(|l| l.balance).collect();
        assert_eq!(balances, vec![dec("10"), dec("6")]);
        assert!(audit.lines[1].movement.work_order.is_some());
    }

    #[test]
    fn test_decrease_to_exactly_zero_is_allowed() {
        let result = next_balance(dec("7"), MovementKind::Decrease, dec("7"));
        assert_eq!(result, Ok(Decimal::ZERO));
    }

    #[test]
    fn test_rejected_movement_reports_available_stock() {
        let result = next_balance(dec("3"), MovementKind::Decrease, dec("7"));
        assert_eq!(
            result,
            Err(BalanceError::InsufficientStock {
                available: dec("3")
            })
        );
    }

    #[test]
    fn test_zero_and_negative_quantities_rejected() {
        for kind in [MovementKind::Increase, MovementKind::Decrease] {
            assert_eq!(
                next_balance(dec("10"), kind, Decimal::ZERO),
                Err(BalanceError::NonPositiveQuantity)
            );
            assert_eq!(
                next_balance(dec("10"), kind, dec("-1")),
                Err(BalanceError::NonPositiveQuantity)
            );
        }
    }

    #[test]
    fn test_reconstruct_produces_running_balances() {
        let ledger = vec![
            movement(1, MovementKind::Increase, dec("50")),
            movement(2, MovementKind::Increase, dec("30")),
            movement(3, MovementKind::Decrease, dec("20")),
            movement(4, MovementKind::Increase, dec("10")),
            movement(5, MovementKind::Decrease, dec("15")),
        ];

        let lines = reconstruct(Decimal::ZERO, &ledger);
        let balances: Vec<Decimal> = lines.iter().map(|l| l.balance).collect();

        // 50, 80, 60, 70, 55
        assert_eq!(
            balances,
            vec![dec("50"), dec("80"), dec("60"), dec("70"), dec("55")]
        );
    }

    #[test]
    fn test_replay_starts_from_initial_quantity() {
        let ledger = vec![movement(1, MovementKind::Decrease, dec("4"))];
        let lines = reconstruct(dec("9"), &ledger);
        assert_eq!(lines[0].balance, dec("5"));
    }

    /// An out-of-band write to the cached quantity is detected, not fixed.
    #[test]
    fn test_audit_flags_corrupted_cache() {
        let ledger = vec![
            movement(1, MovementKind::Increase, dec("10")),
            movement(2, MovementKind::Decrease, dec("3")),
        ];

        let healthy = audit(Decimal::ZERO, &ledger, dec("7"));
        assert!(healthy.consistent);

        let corrupted = audit(Decimal::ZERO, &ledger, dec("9"));
        assert!(!corrupted.consistent);
        assert_eq!(corrupted.computed_quantity, dec("7"));
        assert_eq!(corrupted.cached_quantity, dec("9"));
        // The replay itself is unaffected by the corrupted cache.
        assert_eq!(corrupted.lines.len(), 2);
    }

    /// Ledger order is (created_at, seq); replay only makes sense in that
    /// order, and sorting a shuffled snapshot restores it.
    #[test]
    fn test_ledger_order_is_total() {
        let ledger = vec![
            movement(1, MovementKind::Increase, dec("10")),
            movement(2, MovementKind::Decrease, dec("2")),
            movement(3, MovementKind::Increase, dec("5")),
        ];

        let mut shuffled = vec![ledger[2].clone(), ledger[0].clone(), ledger[1].clone()];
        shuffled.sort_by_key(|m| (m.created_at, m.seq));

        let expected: Vec<Decimal> = reconstruct(Decimal::ZERO, &ledger)
            .iter()
            .map(|l| l.balance)
            .collect();
        let restored: Vec<Decimal> = reconstruct(Decimal::ZERO, &shuffled)
            .iter()
            .map(|l| l.balance)
            .collect();
        assert_eq!(expected, restored);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating valid movement magnitudes (positive decimals)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 1000.0
    }

    /// Strategy for generating movement kinds
    fn kind_strategy() -> impl Strategy<Value = MovementKind> {
        prop_oneof![
            Just(MovementKind::Increase),
            Just(MovementKind::Decrease)
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Balance identity: after any sequence of accepted movements, the
        /// cached quantity equals the initial quantity plus the signed sum
        /// of the ledger.
        #[test]
        fn prop_balance_identity(
            initial in 0i64..1000,
            requests in prop::collection::vec((kind_strategy(), quantity_strategy()), 0..40)
        ) {
            let initial = Decimal::from(initial);
            let mut quantity = initial;
            let mut ledger = Vec::new();

            for (i, (kind, magnitude)) in requests.iter().enumerate() {
                if let Ok(next) = next_balance(quantity, *kind, *magnitude) {
                    quantity = next;
                    ledger.push(movement(i as i64, *kind, *magnitude));
                }
            }

            let signed_sum: Decimal = ledger.iter().map(|m| m.signed_quantity()).sum();
            prop_assert_eq!(quantity, initial + signed_sum);
        }

        /// Non-negativity: no sequence of operations can produce a negative
        /// cached quantity, and every rejected decrease appends nothing.
        #[test]
        fn prop_quantity_never_negative(
            requests in prop::collection::vec((kind_strategy(), quantity_strategy()), 0..40)
        ) {
            let mut quantity = Decimal::ZERO;
            let mut ledger: Vec<StockMovement> = Vec::new();

            for (i, (kind, magnitude)) in requests.iter().enumerate() {
                let before = ledger.len();
                match next_balance(quantity, *kind, *magnitude) {
                    Ok(next) => {
                        quantity = next;
                        ledger.push(movement(i as i64, *kind, *magnitude));
                    }
                    Err(BalanceError::InsufficientStock { available }) => {
                        // Rejected: reports the actual balance, appends nothing.
                        prop_assert_eq!(available, quantity);
                        prop_assert_eq!(ledger.len(), before);
                    }
                    Err(BalanceError::NonPositiveQuantity) => {
                        return Err(TestCaseError::fail("generated a non-positive quantity"));
                    }
                }
                prop_assert!(quantity >= Decimal::ZERO);
            }

            // The surviving ledger replays exactly to the cached quantity.
            let audit = audit(Decimal::ZERO, &ledger, quantity);
            prop_assert!(audit.consistent);
        }

        /// Idempotent replay: reconstructing the same snapshot twice yields
        /// identical output, and the final balance always matches a direct
        /// fold over the signed quantities.
        #[test]
        fn prop_replay_idempotent(
            initial in 0i64..1000,
            entries in prop::collection::vec((kind_strategy(), quantity_strategy()), 1..40)
        ) {
            let initial = Decimal::from(initial);
            let ledger: Vec<StockMovement> = entries
                .iter()
                .enumerate()
                .map(|(i, (kind, magnitude))| movement(i as i64, *kind, *magnitude))
                .collect();

            let first: Vec<Decimal> =
                reconstruct(initial, &ledger).iter().map(|l| l.balance).collect();
            let second: Vec<Decimal> =
                reconstruct(initial, &ledger).iter().map(|l| l.balance).collect();
            prop_assert_eq!(&first, &second);

            let folded = ledger
                .iter()
                .fold(initial, |acc, m| acc + m.signed_quantity());
            prop_assert_eq!(first.last().copied(), Some(folded));
        }

        /// The audit verdict is consistent exactly when the cached value
        /// matches the replayed balance.
        #[test]
        fn prop_audit_detects_any_drift(
            entries in prop::collection::vec((kind_strategy(), quantity_strategy()), 1..20),
            drift in -1000i64..1000
        ) {
            let ledger: Vec<StockMovement> = entries
                .iter()
                .enumerate()
                .map(|(i, (kind, magnitude))| movement(i as i64, *kind, *magnitude))
                .collect();

            let truth = ledger
                .iter()
                .fold(Decimal::from(1000), |acc, m| acc + m.signed_quantity());
            let cached = truth + Decimal::from(drift);

            let audit = audit(Decimal::from(1000), &ledger, cached);
            prop_assert_eq!(audit.consistent, drift == 0);
        }
    }
}

// ============================================================================
// Coordinator Concurrency Semantics
// ============================================================================

#[cfg(test)]
mod concurrency_tests {
    use super::*;

    /// Minimal stand-in for the item row with its optimistic version token.
    struct VersionedItem {
        quantity: Decimal,
        version: i64,
    }

    impl VersionedItem {
        fn read(&self) -> (Decimal, i64) {
            (self.quantity, self.version)
        }

        /// Compare-and-write: succeeds only while the version is unchanged.
        fn try_commit(&mut self, read_version: i64, new_quantity: Decimal) -> bool {
            if self.version != read_version {
                return false;
            }
            self.quantity = new_quantity;
            self.version += 1;
            true
        }
    }

    /// One movement attempt: read, validate against the read, commit, and
    /// retry against fresh state when the version moved underneath us.
    fn apply_with_retry(
        item: &mut VersionedItem,
        kind: MovementKind,
        magnitude: Decimal,
        stale_read: Option<(Decimal, i64)>,
    ) -> Result<Decimal, BalanceError> {
        let mut read = stale_read.unwrap_or_else(|| item.read());
        loop {
            let (current, version) = read;
            let next = next_balance(current, kind, magnitude)?;
            if item.try_commit(version, next) {
                return Ok(next);
            }
            read = item.read();
        }
    }

    /// Two concurrent decreases of 7 against quantity 10: exactly one
    /// commits; the other retries against fresh state and fails with the
    /// stock actually available. Final quantity is 3.
    #[test]
    fn test_concurrent_decrements_commit_exactly_once() {
        let mut item = VersionedItem {
            quantity: dec("10"),
            version: 0,
        };

        // Both callers read (10, v0) before either commits.
        let read_a = item.read();
        let read_b = item.read();

        let result_a = apply_with_retry(
            &mut item,
            MovementKind::Decrease,
            dec("7"),
            Some(read_a),
        );
        let result_b = apply_with_retry(
            &mut item,
            MovementKind::Decrease,
            dec("7"),
            Some(read_b),
        );

        assert_eq!(result_a, Ok(dec("3")));
        assert_eq!(
            result_b,
            Err(BalanceError::InsufficientStock {
                available: dec("3")
            })
        );
        assert_eq!(item.quantity, dec("3"));
        assert_eq!(item.version, 1);
    }

    /// A stale reader whose movement is still satisfiable after the
    /// conflicting commit succeeds on retry instead of failing.
    #[test]
    fn test_conflicting_but_satisfiable_movement_retries_to_success() {
        let mut item = VersionedItem {
            quantity: dec("10"),
            version: 0,
        };

        let read_a = item.read();
        let read_b = item.read();

        let result_a = apply_with_retry(
            &mut item,
            MovementKind::Decrease,
            dec("7"),
            Some(read_a),
        );
        let result_b = apply_with_retry(
            &mut item,
            MovementKind::Decrease,
            dec("2"),
            Some(read_b),
        );

        assert_eq!(result_a, Ok(dec("3")));
        assert_eq!(result_b, Ok(dec("1")));
        assert_eq!(item.quantity, dec("1"));
        assert_eq!(item.version, 2);
    }

    /// Interleaved increases and decreases settle on the signed sum no
    /// matter which caller wins each round.
    #[test]
    fn test_interleaved_movements_preserve_identity() {
        let mut item = VersionedItem {
            quantity: dec("100"),
            version: 0,
        };

        let ops = [
            (MovementKind::Decrease, dec("30")),
            (MovementKind::Increase, dec("5")),
            (MovementKind::Decrease, dec("60")),
            (MovementKind::Increase, dec("10")),
        ];

        let mut committed = Vec::new();
        for (kind, magnitude) in ops {
            if apply_with_retry(&mut item, kind, magnitude, None).is_ok() {
                committed.push(kind.signed(magnitude));
            }
        }

        let signed_sum: Decimal = committed.iter().copied().sum();
        assert_eq!(item.quantity, dec("100") + signed_sum);
        assert_eq!(item.version as usize, committed.len());
    }
}
