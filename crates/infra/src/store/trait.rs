use std::sync::Arc;

use thiserror::Error;

use stockforge_core::{LedgerHandle, MovementId, PlannedTradeId, PrincipalId, ProductName};
use stockforge_ledger::{Movement, NewMovement, PlannedTrade, PlannedTradeDraft, TotalUpdate};

/// Storage operation error.
///
/// These are infrastructure failures (backend, data shape, batch misuse) as
/// opposed to domain errors (validation, stock rules), which never reach the
/// store: callers decide first and only then write.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Concurrent writers collided (e.g. a unique key raced). The batch was
    /// not applied; retrying from a fresh read is safe.
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// The batch referenced a row that does not exist in this scope.
    #[error("invalid write batch: {0}")]
    InvalidBatch(String),

    /// Stored data could not be mapped back into domain types.
    #[error("corrupt ledger data: {0}")]
    Corrupt(String),

    /// The backend itself failed (connection, IO, lock).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// One mutation inside a [`WriteBatch`].
///
/// Ops never reference rows created earlier in the same batch; every target
/// of an overwrite or removal must already exist when the batch is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert a movement at the tail of the batch's ledger. The store
    /// assigns the next id; ids within a ledger strictly increase and are
    /// never reused, and inserts in one batch are assigned in batch order.
    InsertMovement(NewMovement),
    /// Replace every stored field of an existing movement, id included.
    OverwriteMovement(Movement),
    /// Rewrite the running totals of existing movements in place.
    SetRunningTotals(Vec<TotalUpdate>),
    RemoveMovement(MovementId),
    /// Insert a planned trade for the batch's principal. The store assigns
    /// `max(id) + 1` within that principal's trades.
    InsertPlanned(PlannedTradeDraft),
    OverwritePlanned(PlannedTrade),
    RemovePlanned(PlannedTradeId),
}

/// An atomic group of mutations scoped to one ledger.
///
/// Movement ops target the handle's `(principal, warehouse)` ledger; planned
/// ops target the handle's principal. A batch either applies completely or
/// leaves storage untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    pub handle: LedgerHandle,
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn for_ledger(handle: LedgerHandle) -> Self {
        Self {
            handle,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Rows created by a successfully applied batch, ids assigned, in the order
/// their insert ops appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    pub inserted_movements: Vec<Movement>,
    pub inserted_planned: Vec<PlannedTrade>,
}

/// Persistence boundary for warehouse ledgers and planned trades.
///
/// A ledger is the movement sequence of one `(principal, warehouse)` pair;
/// planned trades hang off the principal alone. Both live behind one trait
/// so a shift can remove a trade and insert its ledger rows in a single
/// atomic batch.
///
/// Implementations must:
/// - return movements in ascending id order from every listing method
/// - scope every read and write to the given handle or principal
/// - apply batches atomically: on any failure, storage is unchanged
pub trait WarehouseStore: Send + Sync {
    /// All movements of the handle's ledger, ascending by id.
    fn movements(&self, handle: &LedgerHandle) -> Result<Vec<Movement>, StoreError>;

    fn movement(
        &self,
        handle: &LedgerHandle,
        id: MovementId,
    ) -> Result<Option<Movement>, StoreError>;

    /// Movements of one product with id `>= from`, ascending by id. This is
    /// the replay window for a recalculation walk.
    fn product_movements_from(
        &self,
        handle: &LedgerHandle,
        product: &ProductName,
        from: MovementId,
    ) -> Result<Vec<Movement>, StoreError>;

    /// The product's newest movement, carrying its current stock total.
    fn last_movement(
        &self,
        handle: &LedgerHandle,
        product: &ProductName,
    ) -> Result<Option<Movement>, StoreError>;

    /// The product's newest movement with id `< before`, i.e. the stock
    /// state just ahead of that position.
    fn last_movement_before(
        &self,
        handle: &LedgerHandle,
        product: &ProductName,
        before: MovementId,
    ) -> Result<Option<Movement>, StoreError>;

    /// All planned trades of one principal, ascending by id.
    fn planned_trades(&self, principal: PrincipalId) -> Result<Vec<PlannedTrade>, StoreError>;

    fn planned_trade(
        &self,
        principal: PrincipalId,
        id: PlannedTradeId,
    ) -> Result<Option<PlannedTrade>, StoreError>;

    /// Apply a batch atomically. Overwrites and removals of rows that do not
    /// exist fail the whole batch with [`StoreError::InvalidBatch`].
    fn apply(&self, batch: WriteBatch) -> Result<Applied, StoreError>;
}

impl<S> WarehouseStore for Arc<S>
where
    S: WarehouseStore + ?Sized,
{
    fn movements(&self, handle: &LedgerHandle) -> Result<Vec<Movement>, StoreError> {
        (**self).movements(handle)
    }

    fn movement(
        &self,
        handle: &LedgerHandle,
        id: MovementId,
    ) -> Result<Option<Movement>, StoreError> {
        (**self).movement(handle, id)
    }

    fn product_movements_from(
        &self,
        handle: &LedgerHandle,
        product: &ProductName,
        from: MovementId,
    ) -> Result<Vec<Movement>, StoreError> {
        (**self).product_movements_from(handle, product, from)
    }

    fn last_movement(
        &self,
        handle: &LedgerHandle,
        product: &ProductName,
    ) -> Result<Option<Movement>, StoreError> {
        (**self).last_movement(handle, product)
    }

    fn last_movement_before(
        &self,
        handle: &LedgerHandle,
        product: &ProductName,
        before: MovementId,
    ) -> Result<Option<Movement>, StoreError> {
        (**self).last_movement_before(handle, product, before)
    }

    fn planned_trades(&self, principal: PrincipalId) -> Result<Vec<PlannedTrade>, StoreError> {
        (**self).planned_trades(principal)
    }

    fn planned_trade(
        &self,
        principal: PrincipalId,
        id: PlannedTradeId,
    ) -> Result<Option<PlannedTrade>, StoreError> {
        (**self).planned_trade(principal, id)
    }

    fn apply(&self, batch: WriteBatch) -> Result<Applied, StoreError> {
        (**self).apply(batch)
    }
}
