//! Stock movement model — one entry of the append-only kardex ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Attachment, WorkOrderRef};

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Increase,
    Decrease,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Increase => "increase",
            MovementKind::Decrease => "decrease",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "increase" => Some(MovementKind::Increase),
            "decrease" => Some(MovementKind::Decrease),
            _ => None,
        }
    }

    /// Signed delta this kind applies to a balance.
    pub fn signed(&self, quantity: Decimal) -> Decimal {
        match self {
            MovementKind::Increase => quantity,
            MovementKind::Decrease => -quantity,
        }
    }
}

/// A committed ledger entry.
///
/// Immutable and undeletable for the lifetime of the system; the ledger is
/// the audit trail of the cached item quantity. Ledger order within an item
/// is `(created_at, seq)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    /// Insertion order assigned at commit time.
    pub seq: i64,
    pub item_id: Uuid,
    pub company_id: Uuid,
    pub kind: MovementKind,
    /// Magnitude of the change, strictly positive; the sign is implied by
    /// `kind`.
    pub quantity: Decimal,
    pub notes: Option<String>,
    /// Evidence references, set once at creation.
    pub attachments: Vec<Attachment>,
    /// Only present on `Decrease` movements tied to consumption on an
    /// external work order.
    pub work_order: Option<WorkOrderRef>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// The delta this movement applies to the running balance.
    pub fn signed_quantity(&self) -> Decimal {
        self.kind.signed(self.quantity)
    }
}
