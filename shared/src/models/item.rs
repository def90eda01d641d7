//! Stock item model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stock item tracked by the kardex
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit_cost: Decimal,
    /// Cached current balance. Always equals `initial_quantity` plus the
    /// signed sum of the item's movement history; only the movement
    /// coordinator writes it.
    pub quantity: Decimal,
    /// Low-stock threshold for dashboard flagging. Advisory only, never
    /// blocks a movement.
    pub min_stock: Option<Decimal>,
    /// Balance at ledger genesis, before any recorded movement. Immutable
    /// after creation.
    pub initial_quantity: Decimal,
    /// Optimistic-concurrency token, bumped on every quantity write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Whether the item is at or below its minimum stock threshold.
    pub fn is_low_stock(&self) -> bool {
        match self.min_stock {
            Some(min) => self.quantity <= min,
            None => false,
        }
    }
}
