//! Validation utilities for the stock ledger
//!
//! Shared between the backend services and the browser (via WASM) so both
//! sides reject the same inputs.

use rust_decimal::Decimal;

use crate::types::Attachment;

/// Validate a movement quantity (strictly positive magnitude)
pub fn validate_movement_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Movement quantity must be greater than 0");
    }
    Ok(())
}

/// Validate a unit cost (non-negative)
pub fn validate_unit_cost(unit_cost: Decimal) -> Result<(), &'static str> {
    if unit_cost < Decimal::ZERO {
        return Err("Unit cost cannot be negative");
    }
    Ok(())
}

/// Validate a minimum-stock threshold (non-negative)
pub fn validate_min_stock(min_stock: Decimal) -> Result<(), &'static str> {
    if min_stock < Decimal::ZERO {
        return Err("Minimum stock cannot be negative");
    }
    Ok(())
}

/// Validate an initial quantity (non-negative)
pub fn validate_initial_quantity(initial_quantity: Decimal) -> Result<(), &'static str> {
    if initial_quantity < Decimal::ZERO {
        return Err("Initial quantity cannot be negative");
    }
    Ok(())
}

/// Validate an item name (non-empty, bounded)
pub fn validate_item_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Item name cannot be empty");
    }
    if trimmed.len() > 200 {
        return Err("Item name must be at most 200 characters");
    }
    Ok(())
}

/// Validate an attachment reference
pub fn validate_attachment(attachment: &Attachment) -> Result<(), &'static str> {
    if attachment.name.trim().is_empty() {
        return Err("Attachment name cannot be empty");
    }
    if attachment.url.trim().is_empty() {
        return Err("Attachment URL cannot be empty");
    }
    Ok(())
}
