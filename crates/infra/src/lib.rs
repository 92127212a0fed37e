//! Storage and orchestration for stockforge warehouse ledgers.
//!
//! This crate wires the pure domain (`stockforge-ledger`) to the outside
//! world: the warehouse store boundary with in-memory and Postgres backends,
//! the warehouse catalog, and the engine/coordinator pair every caller goes
//! through.

pub mod catalog;
pub mod engine;
pub mod shift;
pub mod store;

pub use catalog::{CatalogError, InMemoryCatalog, WarehouseCatalog};
pub use engine::{EngineError, LedgerEngine};
pub use shift::ShiftCoordinator;
pub use store::{
    Applied, InMemoryWarehouseStore, PostgresWarehouseStore, StoreError, WarehouseStore,
    WriteBatch, WriteOp,
};

#[cfg(test)]
mod integration_tests;
