//! Pure kardex core: balance arithmetic, ledger replay, read-side filtering.
//!
//! Everything in this module is deterministic and free of I/O so it can run
//! unchanged in the backend, in tests, and in the browser via WASM.

pub mod balance;
pub mod filter;
pub mod reconstruct;

pub use balance::{next_balance, BalanceError};
pub use filter::{filter_lines, filter_movements, DateWindow, KindFilter};
pub use reconstruct::{audit, reconstruct, LedgerAudit, LedgerLine};
