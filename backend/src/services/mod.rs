//! Business logic services for the Kardex Stock Ledger Service

pub mod item;
pub mod kardex;

pub use item::ItemService;
pub use kardex::KardexService;
