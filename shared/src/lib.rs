//! Shared types and models for the Field Service Management Platform
//!
//! This crate contains the stock-ledger domain types and the pure kardex
//! core (balance replay, read-side filtering) shared between the backend
//! and the frontend (via WASM).

pub mod kardex;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
