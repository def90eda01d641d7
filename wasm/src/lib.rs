//! WebAssembly module for the Field Service Management Platform
//!
//! Provides client-side computation for the stock screens:
//! - Running-balance reconstruction for kardex tables
//! - Movement input validation
//! - Low-stock flagging

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Reconstruct running balances from a JSON array of movements.
///
/// `movements_json` must already be in ledger order; returns the kardex
/// lines (movement plus balance) as JSON.
#[wasm_bindgen]
pub fn reconstruct_balances(initial_quantity: &str, movements_json: &str) -> Result<String, JsValue> {
    let initial: Decimal = initial_quantity
        .parse()
        .map_err(|e| JsValue::from_str(&format!("Invalid initial quantity: {}", e)))?;
    let movements: Vec<StockMovement> = serde_json::from_str(movements_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid movements JSON: {}", e)))?;

    let lines = shared::kardex::reconstruct(initial, &movements);
    serde_json::to_string(&lines)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize kardex: {}", e)))
}

/// Compute the balance after applying one movement, for form preview.
///
/// Fails with the same rules the backend enforces: non-positive quantities
/// are invalid and a decrease may not overdraw the current balance.
#[wasm_bindgen]
pub fn preview_balance(current: f64, kind: &str, quantity: f64) -> Result<f64, JsValue> {
    let kind = MovementKind::parse(kind)
        .ok_or_else(|| JsValue::from_str("Unknown movement kind"))?;
    let current = Decimal::try_from(current)
        .map_err(|e| JsValue::from_str(&format!("Invalid current balance: {}", e)))?;
    let quantity = Decimal::try_from(quantity)
        .map_err(|e| JsValue::from_str(&format!("Invalid quantity: {}", e)))?;

    let next = shared::kardex::next_balance(current, kind, quantity)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(next.to_string().parse().unwrap_or(0.0))
}

/// Validate a movement quantity (strictly positive)
#[wasm_bindgen]
pub fn is_valid_movement_quantity(quantity: f64) -> bool {
    Decimal::try_from(quantity)
        .map(|q| validate_movement_quantity(q).is_ok())
        .unwrap_or(false)
}

/// Low-stock check for dashboard flagging
#[wasm_bindgen]
pub fn check_low_stock(quantity: f64, min_stock: Option<f64>) -> bool {
    let quantity = match Decimal::try_from(quantity) {
        Ok(q) => q,
        Err(_) => return false,
    };
    match min_stock.map(Decimal::try_from) {
        Some(Ok(min)) => quantity <= min,
        _ => false,
    }
}
