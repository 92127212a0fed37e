//! Warehouse ledger storage boundary.
//!
//! One trait spans movements and planned trades so a shift can mutate both
//! in a single atomic batch, without making storage assumptions. The in-memory
//! implementation backs tests and dev; Postgres backs production.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryWarehouseStore;
pub use postgres::PostgresWarehouseStore;
pub use r#trait::{Applied, StoreError, WarehouseStore, WriteBatch, WriteOp};
