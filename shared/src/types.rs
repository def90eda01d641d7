//! Common types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Evidence reference attached to a stock movement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Cross-reference to an external work order ("service order")
///
/// The ledger only stores this reference for display; it never queries or
/// validates the work order's existence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkOrderRef {
    pub id: Uuid,
    pub display_code: String,
}
