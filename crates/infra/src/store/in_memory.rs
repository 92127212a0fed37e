use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use stockforge_core::{
    LedgerHandle, MovementId, PlannedTradeId, PrincipalId, ProductName, WarehouseName,
};
use stockforge_ledger::{Movement, PlannedTrade};

use super::r#trait::{Applied, StoreError, WarehouseStore, WriteBatch, WriteOp};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LedgerKey {
    principal: PrincipalId,
    warehouse: WarehouseName,
}

impl LedgerKey {
    fn from_handle(handle: &LedgerHandle) -> Self {
        Self {
            principal: handle.principal(),
            warehouse: handle.warehouse().clone(),
        }
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    rows: BTreeMap<MovementId, Movement>,
    // High-water mark of assigned ids. Removing the newest row must not
    // cause its id to be handed out again.
    last_id: u64,
}

impl LedgerState {
    fn allocate_id(&mut self) -> MovementId {
        self.last_id += 1;
        MovementId::new(self.last_id)
    }
}

#[derive(Debug, Default)]
struct State {
    ledgers: HashMap<LedgerKey, LedgerState>,
    planned: HashMap<PrincipalId, BTreeMap<PlannedTradeId, PlannedTrade>>,
}

/// In-memory warehouse store.
///
/// Intended for tests/dev. Not optimized for performance. Batch atomicity
/// comes from holding the single write lock across validation and apply.
#[derive(Debug, Default)]
pub struct InMemoryWarehouseStore {
    inner: RwLock<State>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl WarehouseStore for InMemoryWarehouseStore {
    fn movements(&self, handle: &LedgerHandle) -> Result<Vec<Movement>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state
            .ledgers
            .get(&LedgerKey::from_handle(handle))
            .map(|ledger| ledger.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    fn movement(
        &self,
        handle: &LedgerHandle,
        id: MovementId,
    ) -> Result<Option<Movement>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state
            .ledgers
            .get(&LedgerKey::from_handle(handle))
            .and_then(|ledger| ledger.rows.get(&id).cloned()))
    }

    fn product_movements_from(
        &self,
        handle: &LedgerHandle,
        product: &ProductName,
        from: MovementId,
    ) -> Result<Vec<Movement>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state
            .ledgers
            .get(&LedgerKey::from_handle(handle))
            .map(|ledger| {
                ledger
                    .rows
                    .range(from..)
                    .map(|(_, row)| row)
                    .filter(|row| &row.product == product)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn last_movement(
        &self,
        handle: &LedgerHandle,
        product: &ProductName,
    ) -> Result<Option<Movement>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state
            .ledgers
            .get(&LedgerKey::from_handle(handle))
            .and_then(|ledger| {
                ledger
                    .rows
                    .values()
                    .rev()
                    .find(|row| &row.product == product)
                    .cloned()
            }))
    }

    fn last_movement_before(
        &self,
        handle: &LedgerHandle,
        product: &ProductName,
        before: MovementId,
    ) -> Result<Option<Movement>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state
            .ledgers
            .get(&LedgerKey::from_handle(handle))
            .and_then(|ledger| {
                ledger
                    .rows
                    .range(..before)
                    .rev()
                    .map(|(_, row)| row)
                    .find(|row| &row.product == product)
                    .cloned()
            }))
    }

    fn planned_trades(&self, principal: PrincipalId) -> Result<Vec<PlannedTrade>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state
            .planned
            .get(&principal)
            .map(|trades| trades.values().cloned().collect())
            .unwrap_or_default())
    }

    fn planned_trade(
        &self,
        principal: PrincipalId,
        id: PlannedTradeId,
    ) -> Result<Option<PlannedTrade>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state
            .planned
            .get(&principal)
            .and_then(|trades| trades.get(&id).cloned()))
    }

    fn apply(&self, batch: WriteBatch) -> Result<Applied, StoreError> {
        let WriteBatch { handle, ops } = batch;
        let key = LedgerKey::from_handle(&handle);
        let principal = handle.principal();

        let mut state = self.inner.write().map_err(|_| poisoned())?;

        // Validate every op against the pre-batch state first so a failing
        // batch leaves nothing behind.
        {
            let ledger = state.ledgers.get(&key);
            let trades = state.planned.get(&principal);

            let movement_exists =
                |id: &MovementId| ledger.is_some_and(|l| l.rows.contains_key(id));
            let trade_exists =
                |id: &PlannedTradeId| trades.is_some_and(|t| t.contains_key(id));

            for (idx, op) in ops.iter().enumerate() {
                match op {
                    WriteOp::InsertMovement(_) | WriteOp::InsertPlanned(_) => {}
                    WriteOp::OverwriteMovement(row) => {
                        if !movement_exists(&row.id) {
                            return Err(StoreError::InvalidBatch(format!(
                                "overwrite of missing movement {} (op {idx})",
                                row.id
                            )));
                        }
                    }
                    WriteOp::SetRunningTotals(updates) => {
                        for update in updates {
                            if !movement_exists(&update.id) {
                                return Err(StoreError::InvalidBatch(format!(
                                    "running-total update for missing movement {} (op {idx})",
                                    update.id
                                )));
                            }
                        }
                    }
                    WriteOp::RemoveMovement(id) => {
                        if !movement_exists(id) {
                            return Err(StoreError::InvalidBatch(format!(
                                "removal of missing movement {id} (op {idx})"
                            )));
                        }
                    }
                    WriteOp::OverwritePlanned(trade) => {
                        if !trade_exists(&trade.id) {
                            return Err(StoreError::InvalidBatch(format!(
                                "overwrite of missing planned trade {} (op {idx})",
                                trade.id
                            )));
                        }
                    }
                    WriteOp::RemovePlanned(id) => {
                        if !trade_exists(id) {
                            return Err(StoreError::InvalidBatch(format!(
                                "removal of missing planned trade {id} (op {idx})"
                            )));
                        }
                    }
                }
            }
        }

        let mut applied = Applied::default();
        for op in ops {
            match op {
                WriteOp::InsertMovement(row) => {
                    let ledger = state.ledgers.entry(key.clone()).or_default();
                    let id = ledger.allocate_id();
                    let stored = row.assign(id);
                    ledger.rows.insert(id, stored.clone());
                    applied.inserted_movements.push(stored);
                }
                WriteOp::OverwriteMovement(row) => {
                    let ledger = state.ledgers.entry(key.clone()).or_default();
                    ledger.rows.insert(row.id, row);
                }
                WriteOp::SetRunningTotals(updates) => {
                    let ledger = state.ledgers.entry(key.clone()).or_default();
                    for update in updates {
                        if let Some(row) = ledger.rows.get_mut(&update.id) {
                            row.running_total = update.running_total;
                        }
                    }
                }
                WriteOp::RemoveMovement(id) => {
                    if let Some(ledger) = state.ledgers.get_mut(&key) {
                        ledger.rows.remove(&id);
                    }
                }
                WriteOp::InsertPlanned(draft) => {
                    let trades = state.planned.entry(principal).or_default();
                    let next = trades
                        .keys()
                        .next_back()
                        .map(|id| id.value() + 1)
                        .unwrap_or(1);
                    let stored = draft.assign(PlannedTradeId::new(next));
                    trades.insert(stored.id, stored.clone());
                    applied.inserted_planned.push(stored);
                }
                WriteOp::OverwritePlanned(trade) => {
                    let trades = state.planned.entry(principal).or_default();
                    trades.insert(trade.id, trade);
                }
                WriteOp::RemovePlanned(id) => {
                    if let Some(trades) = state.planned.get_mut(&principal) {
                        trades.remove(&id);
                    }
                }
            }
        }

        Ok(applied)
    }
}
