//! Warehouse stock ledger domain: movement and planned-trade records, plus
//! the pure arithmetic that keeps stored running totals consistent.
//!
//! Everything here is side-effect free. Persistence and orchestration live
//! in `stockforge-infra`; this crate only decides what a valid ledger looks
//! like.

pub mod balance;
pub mod movement;
pub mod planned;

pub use balance::{TotalUpdate, plan_append, recalculate};
pub use movement::{Leg, Movement, MovementDraft, MovementSide, NewMovement};
pub use planned::{PlannedTrade, PlannedTradeDraft};
