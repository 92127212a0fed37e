use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockforge_core::{DomainError, DomainResult, MovementId, ProductName};

/// One leg of a trade: how many units and at what unit price.
///
/// Prices are in minor currency units (e.g. cents), matching the convention
/// used for all monetary amounts in this workspace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub quantity: i64,
    pub unit_price: i64,
}

impl Leg {
    pub fn new(quantity: i64, unit_price: i64) -> Self {
        Self {
            quantity,
            unit_price,
        }
    }

    pub(crate) fn validate(&self, label: &str) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "{label} quantity must be positive (got {})",
                self.quantity
            )));
        }
        if self.unit_price < 0 {
            return Err(DomainError::validation(format!(
                "{label} unit price cannot be negative (got {})",
                self.unit_price
            )));
        }
        Ok(())
    }
}

/// Direction of a ledger movement.
///
/// A ledger row is always a pure import or a pure export, never both; a
/// planned trade that carries both legs becomes two rows when shifted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementSide {
    Import(Leg),
    Export(Leg),
}

impl MovementSide {
    /// Signed stock change: `+quantity` for imports, `-quantity` for exports.
    pub fn delta(&self) -> i64 {
        match self {
            MovementSide::Import(leg) => leg.quantity,
            MovementSide::Export(leg) => -leg.quantity,
        }
    }

    pub fn leg(&self) -> &Leg {
        match self {
            MovementSide::Import(leg) | MovementSide::Export(leg) => leg,
        }
    }

    pub fn is_import(&self) -> bool {
        matches!(self, MovementSide::Import(_))
    }

    pub fn is_export(&self) -> bool {
        matches!(self, MovementSide::Export(_))
    }

    pub(crate) fn validate(&self) -> DomainResult<()> {
        match self {
            MovementSide::Import(leg) => leg.validate("import"),
            MovementSide::Export(leg) => leg.validate("export"),
        }
    }
}

/// Caller-supplied fields of a movement, before the store has assigned an id
/// and before the running total has been computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub product: ProductName,
    pub supplier: Option<String>,
    pub customer: Option<String>,
    pub side: MovementSide,
    pub effective_date: NaiveDate,
}

impl MovementDraft {
    pub fn import(product: ProductName, leg: Leg, effective_date: NaiveDate) -> Self {
        Self {
            product,
            supplier: None,
            customer: None,
            side: MovementSide::Import(leg),
            effective_date,
        }
    }

    pub fn export(product: ProductName, leg: Leg, effective_date: NaiveDate) -> Self {
        Self {
            product,
            supplier: None,
            customer: None,
            side: MovementSide::Export(leg),
            effective_date,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.side.validate()
    }
}

/// A movement whose running total has been computed but which the store has
/// not yet assigned an id. Produced by append planning, consumed by an
/// atomic write batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub product: ProductName,
    pub supplier: Option<String>,
    pub customer: Option<String>,
    pub side: MovementSide,
    pub running_total: i64,
    pub effective_date: NaiveDate,
}

impl NewMovement {
    /// Finalize the row once the store has picked its position.
    pub fn assign(self, id: MovementId) -> Movement {
        Movement {
            id,
            product: self.product,
            supplier: self.supplier,
            customer: self.customer,
            side: self.side,
            running_total: self.running_total,
            effective_date: self.effective_date,
        }
    }
}

/// One stored row of a warehouse ledger.
///
/// `running_total` is derived state: the prefix sum of `(import - export)`
/// deltas over all rows of the same product with id at or below this one.
/// It is written only by append planning and the recalculation walk, never
/// ad hoc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product: ProductName,
    pub supplier: Option<String>,
    pub customer: Option<String>,
    pub side: MovementSide,
    pub running_total: i64,
    pub effective_date: NaiveDate,
}

impl Movement {
    pub fn delta(&self) -> i64 {
        self.side.delta()
    }
}
