//! Ledger operations (application-level orchestration).
//!
//! Every mutation follows the same pipeline:
//!
//! ```text
//! resolve principal (session)
//!   -> resolve ledger handle (catalog)
//!   -> read the affected rows (store)
//!   -> decide the outcome purely (stockforge-ledger)
//!   -> commit one atomic write batch (store)
//!   -> notify warehouse activity (catalog, best-effort)
//! ```
//!
//! All stock rules run on data read up front, so a refused operation never
//! reaches the store and a failed batch leaves the ledger untouched. This
//! module contains no IO of its own; it composes the injected ports.

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use stockforge_auth::Session;
use stockforge_core::{DomainError, LedgerHandle, MovementId, ProductName, WarehouseName};
use stockforge_ledger::{Movement, MovementDraft, TotalUpdate, plan_append, recalculate};

use crate::catalog::{CatalogError, WarehouseCatalog};
use crate::store::{StoreError, WarehouseStore, WriteBatch, WriteOp};

/// Unified error for engine and coordinator operations.
///
/// Domain refusals are flattened into their own variants so callers can
/// match on outcomes without digging through source errors; storage faults
/// pass through as [`EngineError::Store`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no authenticated principal")]
    Unauthenticated,

    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient stock of '{product}': requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductName,
        requested: i64,
        available: i64,
    },

    #[error("negative stock at movement {id}: running total would reach {projected}")]
    NegativeStock { id: MovementId, projected: i64 },

    #[error("unknown warehouse '{0}'")]
    UnknownWarehouse(WarehouseName),

    #[error("warehouse catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Unauthenticated => EngineError::Unauthenticated,
            DomainError::NotFound => EngineError::NotFound,
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::InsufficientStock {
                product,
                requested,
                available,
            } => EngineError::InsufficientStock {
                product,
                requested,
                available,
            },
            DomainError::NegativeStock { id, projected } => {
                EngineError::NegativeStock { id, projected }
            }
        }
    }
}

impl From<CatalogError> for EngineError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::UnknownWarehouse(name) => EngineError::UnknownWarehouse(name),
            CatalogError::Unavailable(msg) => EngineError::CatalogUnavailable(msg),
        }
    }
}

/// Movement operations over one principal's warehouse ledgers.
///
/// Generic over its three ports: a [`WarehouseStore`] for persistence, a
/// [`WarehouseCatalog`] for warehouse resolution, and a [`Session`] for the
/// caller's identity. Tests wire in-memory implementations; production wires
/// Postgres behind the same calls.
#[derive(Debug)]
pub struct LedgerEngine<S, C, A> {
    store: S,
    catalog: C,
    session: A,
}

impl<S, C, A> LedgerEngine<S, C, A> {
    pub fn new(store: S, catalog: C, session: A) -> Self {
        Self {
            store,
            catalog,
            session,
        }
    }
}

impl<S, C, A> LedgerEngine<S, C, A>
where
    S: WarehouseStore,
    C: WarehouseCatalog,
    A: Session,
{
    /// Append a movement at the tail of the warehouse ledger.
    ///
    /// Exports are checked against the product's current total; the stored
    /// row carries its running total from the moment it is written.
    #[instrument(skip(self, draft), fields(warehouse = %warehouse), err)]
    pub fn append(
        &self,
        warehouse: &WarehouseName,
        draft: MovementDraft,
    ) -> Result<Movement, EngineError> {
        let handle = self.resolve(warehouse)?;

        let current = self
            .store
            .last_movement(&handle, &draft.product)?
            .map(|row| row.running_total)
            .unwrap_or(0);
        let planned = plan_append(current, draft)?;

        let mut batch = WriteBatch::for_ledger(handle.clone());
        batch.push(WriteOp::InsertMovement(planned));
        let mut applied = self.store.apply(batch)?;
        let stored = applied.inserted_movements.pop().ok_or_else(|| {
            StoreError::Backend("batch applied without returning the inserted movement".to_string())
        })?;

        tracing::info!(ledger = %handle, id = %stored.id, total = stored.running_total, "movement appended");
        self.catalog.notify_activity(&handle, Utc::now());
        Ok(stored)
    }

    /// Replace the caller-supplied fields of an existing movement.
    ///
    /// Running totals are recomputed for every affected row at or after the
    /// edited position; a rename reshapes both the old and the new product's
    /// sequences. If any projected total would go negative the whole update
    /// is refused and the ledger is left exactly as it was.
    #[instrument(skip(self, draft), fields(warehouse = %warehouse, id = %id), err)]
    pub fn update(
        &self,
        warehouse: &WarehouseName,
        id: MovementId,
        draft: MovementDraft,
    ) -> Result<Movement, EngineError> {
        let handle = self.resolve(warehouse)?;

        draft.validate()?;
        let existing = self
            .store
            .movement(&handle, id)?
            .ok_or(EngineError::NotFound)?;

        let mut replacement = Movement {
            id,
            product: draft.product.clone(),
            supplier: draft.supplier.clone(),
            customer: draft.customer.clone(),
            side: draft.side,
            running_total: existing.running_total,
            effective_date: draft.effective_date,
        };

        // Walk the edited product's rows with the replacement spliced in.
        let mut rows = self
            .store
            .product_movements_from(&handle, &draft.product, id)?;
        rows.retain(|row| row.id != id);
        let at = rows.partition_point(|row| row.id < id);
        rows.insert(at, replacement.clone());
        let base = self.base_total(&handle, &draft.product, id)?;
        let updates = recalculate(base, &rows)?;

        for update in &updates {
            if update.id == id {
                replacement.running_total = update.running_total;
            }
        }
        let mut totals: Vec<TotalUpdate> =
            updates.into_iter().filter(|update| update.id != id).collect();

        // A rename also reshapes the sequence the row is leaving.
        if existing.product != draft.product {
            let mut rows = self
                .store
                .product_movements_from(&handle, &existing.product, id)?;
            rows.retain(|row| row.id != id);
            let base = self.base_total(&handle, &existing.product, id)?;
            totals.extend(recalculate(base, &rows)?);
        }

        let mut batch = WriteBatch::for_ledger(handle.clone());
        batch.push(WriteOp::OverwriteMovement(replacement.clone()));
        if !totals.is_empty() {
            batch.push(WriteOp::SetRunningTotals(totals));
        }
        self.store.apply(batch)?;

        tracing::info!(ledger = %handle, id = %id, "movement updated");
        self.catalog.notify_activity(&handle, Utc::now());
        Ok(replacement)
    }

    /// Remove a movement and close the gap it leaves.
    ///
    /// Later rows of the same product are replayed without it; if the
    /// removal would strand an export past available stock, nothing changes.
    #[instrument(skip(self), fields(warehouse = %warehouse, id = %id), err)]
    pub fn delete(&self, warehouse: &WarehouseName, id: MovementId) -> Result<(), EngineError> {
        let handle = self.resolve(warehouse)?;

        let existing = self
            .store
            .movement(&handle, id)?
            .ok_or(EngineError::NotFound)?;

        let mut rows = self
            .store
            .product_movements_from(&handle, &existing.product, id)?;
        rows.retain(|row| row.id != id);
        let base = self.base_total(&handle, &existing.product, id)?;
        let updates = recalculate(base, &rows)?;

        let mut batch = WriteBatch::for_ledger(handle.clone());
        batch.push(WriteOp::RemoveMovement(id));
        if !updates.is_empty() {
            batch.push(WriteOp::SetRunningTotals(updates));
        }
        self.store.apply(batch)?;

        tracing::info!(ledger = %handle, id = %id, "movement deleted");
        self.catalog.notify_activity(&handle, Utc::now());
        Ok(())
    }

    pub fn movement(
        &self,
        warehouse: &WarehouseName,
        id: MovementId,
    ) -> Result<Movement, EngineError> {
        let handle = self.resolve(warehouse)?;
        self.store
            .movement(&handle, id)?
            .ok_or(EngineError::NotFound)
    }

    /// The whole ledger in id order.
    pub fn movements(&self, warehouse: &WarehouseName) -> Result<Vec<Movement>, EngineError> {
        let handle = self.resolve(warehouse)?;
        Ok(self.store.movements(&handle)?)
    }

    /// Current stock of one product (0 if it never moved).
    pub fn current_total(
        &self,
        warehouse: &WarehouseName,
        product: &ProductName,
    ) -> Result<i64, EngineError> {
        let handle = self.resolve(warehouse)?;
        Ok(self
            .store
            .last_movement(&handle, product)?
            .map(|row| row.running_total)
            .unwrap_or(0))
    }

    /// Stock of one product just ahead of the given position.
    pub fn total_before(
        &self,
        warehouse: &WarehouseName,
        product: &ProductName,
        id: MovementId,
    ) -> Result<i64, EngineError> {
        let handle = self.resolve(warehouse)?;
        self.base_total(&handle, product, id)
    }

    fn resolve(&self, warehouse: &WarehouseName) -> Result<LedgerHandle, EngineError> {
        let principal = self.session.require_principal()?;
        Ok(self.catalog.ledger_for(principal.id, warehouse)?)
    }

    fn base_total(
        &self,
        handle: &LedgerHandle,
        product: &ProductName,
        before: MovementId,
    ) -> Result<i64, EngineError> {
        Ok(self
            .store
            .last_movement_before(handle, product, before)?
            .map(|row| row.running_total)
            .unwrap_or(0))
    }
}
