//! `stockforge-auth` — the authentication boundary for ledger access.
//!
//! This crate is intentionally decoupled from transport and storage: it only
//! answers "who is calling?". All ownership and stock rules live elsewhere.

pub mod principal;
pub mod session;

pub use principal::Principal;
pub use session::{FixedSession, NoSession, Session, SharedSession};
