use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockforge_core::{DomainResult, PlannedTradeId, ProductName, WarehouseName};

use crate::movement::Leg;

/// Caller-supplied fields of a planned trade, before the store has assigned
/// an id within the owning principal's sequence.
///
/// Either leg may be absent. A trade with both legs shifts into two ledger
/// rows, one leg into one row, and a legless trade is simply removed from
/// the plan when shifted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTradeDraft {
    pub warehouse: WarehouseName,
    pub product: ProductName,
    pub supplier: Option<String>,
    pub customer: Option<String>,
    pub import: Option<Leg>,
    pub export: Option<Leg>,
    pub effective_date: NaiveDate,
}

impl PlannedTradeDraft {
    pub fn import_only(
        warehouse: WarehouseName,
        product: ProductName,
        leg: Leg,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            warehouse,
            product,
            supplier: None,
            customer: None,
            import: Some(leg),
            export: None,
            effective_date,
        }
    }

    pub fn export_only(
        warehouse: WarehouseName,
        product: ProductName,
        leg: Leg,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            warehouse,
            product,
            supplier: None,
            customer: None,
            import: None,
            export: Some(leg),
            effective_date,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(leg) = &self.import {
            leg.validate("planned import")?;
        }
        if let Some(leg) = &self.export {
            leg.validate("planned export")?;
        }
        Ok(())
    }

    pub fn assign(self, id: PlannedTradeId) -> PlannedTrade {
        PlannedTrade {
            id,
            warehouse: self.warehouse,
            product: self.product,
            supplier: self.supplier,
            customer: self.customer,
            import: self.import,
            export: self.export,
            effective_date: self.effective_date,
        }
    }
}

/// A trade a principal intends to execute later against one of their
/// warehouse ledgers. Ids are sequential per principal, not per warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTrade {
    pub id: PlannedTradeId,
    pub warehouse: WarehouseName,
    pub product: ProductName,
    pub supplier: Option<String>,
    pub customer: Option<String>,
    pub import: Option<Leg>,
    pub export: Option<Leg>,
    pub effective_date: NaiveDate,
}

impl PlannedTrade {
    /// Number of ledger rows this trade will produce when shifted.
    pub fn leg_count(&self) -> usize {
        usize::from(self.import.is_some()) + usize::from(self.export.is_some())
    }
}
