//! Planned trades and the shift that turns them into ledger rows.

use chrono::Utc;
use tracing::instrument;

use stockforge_auth::Session;
use stockforge_core::{LedgerHandle, PlannedTradeId, PrincipalId};
use stockforge_ledger::{Movement, MovementDraft, PlannedTrade, PlannedTradeDraft, plan_append};

use crate::catalog::WarehouseCatalog;
use crate::engine::EngineError;
use crate::store::{StoreError, WarehouseStore, WriteBatch, WriteOp};

/// Planned-trade bookkeeping and the shift pipeline.
///
/// Trades are plans only: they live outside every warehouse ledger and hold
/// no stock. A shift converts one trade into its ledger rows and removes it
/// in a single atomic batch, so the plan and the ledger cannot disagree.
/// Warehouse names inside trades stay unresolved until shift time; a trade
/// pointing at a warehouse the principal no longer has is refused then.
#[derive(Debug)]
pub struct ShiftCoordinator<S, C, A> {
    store: S,
    catalog: C,
    session: A,
}

impl<S, C, A> ShiftCoordinator<S, C, A> {
    pub fn new(store: S, catalog: C, session: A) -> Self {
        Self {
            store,
            catalog,
            session,
        }
    }
}

impl<S, C, A> ShiftCoordinator<S, C, A>
where
    S: WarehouseStore,
    C: WarehouseCatalog,
    A: Session,
{
    /// Record a new planned trade for the calling principal.
    ///
    /// The id is assigned within the principal's own sequence. Either leg
    /// may be absent; a legless trade is a note that shifts into nothing.
    #[instrument(skip(self, draft), err)]
    pub fn add(&self, draft: PlannedTradeDraft) -> Result<PlannedTrade, EngineError> {
        let principal = self.principal()?;
        draft.validate()?;

        let mut batch =
            WriteBatch::for_ledger(LedgerHandle::new(principal, draft.warehouse.clone()));
        batch.push(WriteOp::InsertPlanned(draft));
        let mut applied = self.store.apply(batch)?;
        let stored = applied.inserted_planned.pop().ok_or_else(|| {
            StoreError::Backend("batch applied without returning the inserted trade".to_string())
        })?;

        tracing::info!(principal = %principal, id = %stored.id, "planned trade recorded");
        Ok(stored)
    }

    pub fn planned_trade(&self, id: PlannedTradeId) -> Result<PlannedTrade, EngineError> {
        let principal = self.principal()?;
        self.store
            .planned_trade(principal, id)?
            .ok_or(EngineError::NotFound)
    }

    /// All of the caller's planned trades, ascending by id.
    pub fn planned_trades(&self) -> Result<Vec<PlannedTrade>, EngineError> {
        let principal = self.principal()?;
        Ok(self.store.planned_trades(principal)?)
    }

    /// Replace every caller-supplied field of an existing trade.
    #[instrument(skip(self, draft), fields(id = %id), err)]
    pub fn update(
        &self,
        id: PlannedTradeId,
        draft: PlannedTradeDraft,
    ) -> Result<PlannedTrade, EngineError> {
        let principal = self.principal()?;
        draft.validate()?;
        if self.store.planned_trade(principal, id)?.is_none() {
            return Err(EngineError::NotFound);
        }

        let replacement = draft.assign(id);
        let mut batch =
            WriteBatch::for_ledger(LedgerHandle::new(principal, replacement.warehouse.clone()));
        batch.push(WriteOp::OverwritePlanned(replacement.clone()));
        self.store.apply(batch)?;
        Ok(replacement)
    }

    /// Drop a trade from the plan without touching any ledger.
    #[instrument(skip(self), fields(id = %id), err)]
    pub fn remove(&self, id: PlannedTradeId) -> Result<(), EngineError> {
        let principal = self.principal()?;
        let existing = self
            .store
            .planned_trade(principal, id)?
            .ok_or(EngineError::NotFound)?;

        let mut batch = WriteBatch::for_ledger(LedgerHandle::new(principal, existing.warehouse));
        batch.push(WriteOp::RemovePlanned(id));
        self.store.apply(batch)?;
        Ok(())
    }

    /// Execute a planned trade against its warehouse ledger.
    ///
    /// The import leg (if any) lands first, then the export leg; the export
    /// may spend stock its own import just brought in. The inserted rows and
    /// the trade's removal commit as one batch, so a trade is never left
    /// half-shifted. Returns the created rows oldest first: zero, one, or
    /// two of them.
    #[instrument(skip(self), fields(id = %id), err)]
    pub fn shift(&self, id: PlannedTradeId) -> Result<Vec<Movement>, EngineError> {
        let principal = self.principal()?;
        let trade = self
            .store
            .planned_trade(principal, id)?
            .ok_or(EngineError::NotFound)?;
        let handle = self.catalog.ledger_for(principal, &trade.warehouse)?;

        let mut available = self
            .store
            .last_movement(&handle, &trade.product)?
            .map(|row| row.running_total)
            .unwrap_or(0);

        let mut batch = WriteBatch::for_ledger(handle.clone());
        if let Some(leg) = trade.import {
            let mut draft =
                MovementDraft::import(trade.product.clone(), leg, trade.effective_date);
            draft.supplier = trade.supplier.clone();
            let planned = plan_append(available, draft)?;
            available = planned.running_total;
            batch.push(WriteOp::InsertMovement(planned));
        }
        if let Some(leg) = trade.export {
            let mut draft =
                MovementDraft::export(trade.product.clone(), leg, trade.effective_date);
            draft.customer = trade.customer.clone();
            let planned = plan_append(available, draft)?;
            batch.push(WriteOp::InsertMovement(planned));
        }
        batch.push(WriteOp::RemovePlanned(id));

        let applied = self.store.apply(batch)?;

        tracing::info!(
            ledger = %handle,
            trade = %id,
            rows = applied.inserted_movements.len(),
            "planned trade shifted"
        );
        if !applied.inserted_movements.is_empty() {
            self.catalog.notify_activity(&handle, Utc::now());
        }
        Ok(applied.inserted_movements)
    }

    fn principal(&self) -> Result<PrincipalId, EngineError> {
        Ok(self.session.require_principal()?.id)
    }
}
