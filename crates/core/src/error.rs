//! Domain error model.

use thiserror::Error;

use crate::id::MovementId;
use crate::name::ProductName;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a deterministic outcome of the requested change, never a
/// transient fault, so none of them is retried anywhere in the core.
/// Infrastructure failures live in the storage layer's own error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No authenticated principal; every operation refuses.
    #[error("no authenticated principal")]
    Unauthenticated,

    /// A referenced row, ledger, or planned trade does not exist or is not
    /// owned by the caller.
    #[error("not found")]
    NotFound,

    /// A draft failed validation (e.g. empty product name, zero quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An export asked for more stock than the product currently has.
    /// Nothing was written.
    #[error("insufficient stock of '{product}': requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductName,
        requested: i64,
        available: i64,
    },

    /// A recalculation walk would drive the named row's running total
    /// negative. The triggering operation was not committed.
    #[error("negative stock at movement {id}: running total would reach {projected}")]
    NegativeStock { id: MovementId, projected: i64 },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
