//! Stock item tests
//!
//! Tests for item registry rules: input validation on the genesis path,
//! low-stock flagging, and the guarantee that metadata edits leave the
//! ledger-backed quantity untouched.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::kardex::next_balance;
use shared::models::{MovementKind, StockItem};
use shared::types::Attachment;
use shared::validation::{
    validate_attachment, validate_initial_quantity, validate_item_name, validate_min_stock,
    validate_movement_quantity, validate_unit_cost,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item(quantity: Decimal, min_stock: Option<Decimal>) -> StockItem {
    StockItem {
        id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        name: "Circuit breaker 20A".to_string(),
        description: Some("DIN rail mount".to_string()),
        unit_cost: dec("12.50"),
        quantity,
        min_stock,
        initial_quantity: Decimal::ZERO,
        version: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_low_stock_needs_a_threshold() {
        assert!(!item(Decimal::ZERO, None).is_low_stock());
        assert!(!item(dec("100"), None).is_low_stock());
    }

    /// The threshold is inclusive: quantity equal to min_stock flags.
    #[test]
    fn test_low_stock_threshold_inclusive() {
        assert!(item(dec("5"), Some(dec("5"))).is_low_stock());
        assert!(item(dec("4.9"), Some(dec("5"))).is_low_stock());
        assert!(!item(dec("5.1"), Some(dec("5"))).is_low_stock());
    }

    #[test]
    fn test_zero_threshold_flags_only_empty_stock() {
        assert!(item(Decimal::ZERO, Some(Decimal::ZERO)).is_low_stock());
        assert!(!item(dec("0.1"), Some(Decimal::ZERO)).is_low_stock());
    }

    #[test]
    fn test_genesis_input_validation() {
        assert!(validate_item_name("PVC pipe 20mm").is_ok());
        assert!(validate_item_name("  ").is_err());

        assert!(validate_unit_cost(Decimal::ZERO).is_ok());
        assert!(validate_unit_cost(dec("-0.01")).is_err());

        assert!(validate_min_stock(dec("10")).is_ok());
        assert!(validate_min_stock(dec("-10")).is_err());

        assert!(validate_initial_quantity(Decimal::ZERO).is_ok());
        assert!(validate_initial_quantity(dec("-1")).is_err());
    }

    #[test]
    fn test_movement_quantity_validation() {
        assert!(validate_movement_quantity(dec("0.1")).is_ok());
        assert!(validate_movement_quantity(Decimal::ZERO).is_err());
        assert!(validate_movement_quantity(dec("-3")).is_err());
    }

    #[test]
    fn test_attachment_validation() {
        let attachment = Attachment {
            name: "receipt.jpg".to_string(),
            url: "https://files.example.com/receipt.jpg".to_string(),
        };
        assert!(validate_attachment(&attachment).is_ok());

        let missing_url = Attachment {
            name: "receipt.jpg".to_string(),
            url: "  ".to_string(),
        };
        assert!(validate_attachment(&missing_url).is_err());
    }

    /// A metadata edit rebuilds every descriptive field while the cached
    /// quantity, genesis quantity and version stay what the ledger says.
    #[test]
    fn test_metadata_edit_leaves_ledger_fields_alone() {
        let before = item(dec("42"), Some(dec("10")));

        let after = StockItem {
            name: "Circuit breaker 25A".to_string(),
            description: None,
            unit_cost: dec("13.75"),
            min_stock: Some(dec("8")),
            updated_at: Utc::now(),
            ..before.clone()
        };

        assert_eq!(after.quantity, before.quantity);
        assert_eq!(after.initial_quantity, before.initial_quantity);
        assert_eq!(after.version, before.version);
        assert_ne!(after.name, before.name);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100000i64).prop_map(|n| Decimal::new(n, 2)) // 0.00 to 1000.00
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Low stock flags exactly when a threshold exists and the quantity
        /// does not exceed it.
        #[test]
        fn prop_low_stock_definition(
            quantity in quantity_strategy(),
            min_stock in prop::option::of(quantity_strategy())
        ) {
            let flagged = item(quantity, min_stock).is_low_stock();
            let expected = matches!(min_stock, Some(min) if quantity <= min);
            prop_assert_eq!(flagged, expected);
        }

        /// The advisory threshold never blocks a movement: draining stock
        /// to zero succeeds even when it crosses min_stock.
        #[test]
        fn prop_threshold_never_blocks_movements(
            quantity in 1i64..1000,
            min_stock in prop::option::of(quantity_strategy())
        ) {
            let stocked = item(Decimal::from(quantity), min_stock);
            let drained = next_balance(stocked.quantity, MovementKind::Decrease, stocked.quantity);
            prop_assert_eq!(drained, Ok(Decimal::ZERO));
        }
    }
}
