//! Database models for the Kardex Stock Ledger Service
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
