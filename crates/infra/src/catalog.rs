//! Warehouse catalog: which warehouses a principal may operate on, and when
//! each one last saw a committed change.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use stockforge_core::{LedgerHandle, PrincipalId, WarehouseName};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown warehouse '{0}'")]
    UnknownWarehouse(WarehouseName),

    #[error("warehouse catalog unavailable: {0}")]
    Unavailable(String),
}

/// Registry of the warehouses each principal may operate on.
///
/// Resolution happens per call: the caller names a warehouse and the catalog
/// answers with a ledger handle or refuses. Activity notification is
/// best-effort bookkeeping; failing to record it must never affect the
/// ledger operation that triggered it, so the method cannot return an error.
pub trait WarehouseCatalog: Send + Sync {
    /// Resolve a warehouse name to a ledger handle for this principal.
    fn ledger_for(
        &self,
        principal: PrincipalId,
        warehouse: &WarehouseName,
    ) -> Result<LedgerHandle, CatalogError>;

    /// Record that the handle's ledger was modified at `at`.
    fn notify_activity(&self, handle: &LedgerHandle, at: DateTime<Utc>);
}

impl<C> WarehouseCatalog for Arc<C>
where
    C: WarehouseCatalog + ?Sized,
{
    fn ledger_for(
        &self,
        principal: PrincipalId,
        warehouse: &WarehouseName,
    ) -> Result<LedgerHandle, CatalogError> {
        (**self).ledger_for(principal, warehouse)
    }

    fn notify_activity(&self, handle: &LedgerHandle, at: DateTime<Utc>) {
        (**self).notify_activity(handle, at)
    }
}

/// In-memory catalog. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<HashMap<PrincipalId, HashMap<WarehouseName, Option<DateTime<Utc>>>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a warehouse available to a principal.
    pub fn register(&self, principal: PrincipalId, warehouse: WarehouseName) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner
            .entry(principal)
            .or_default()
            .entry(warehouse)
            .or_insert(None);
    }

    /// When the principal's warehouse last saw a committed change, if ever.
    pub fn last_activity(
        &self,
        principal: PrincipalId,
        warehouse: &WarehouseName,
    ) -> Option<DateTime<Utc>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .get(&principal)
            .and_then(|warehouses| warehouses.get(warehouse))
            .copied()
            .flatten()
    }
}

impl WarehouseCatalog for InMemoryCatalog {
    fn ledger_for(
        &self,
        principal: PrincipalId,
        warehouse: &WarehouseName,
    ) -> Result<LedgerHandle, CatalogError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| CatalogError::Unavailable("lock poisoned".to_string()))?;

        let known = inner
            .get(&principal)
            .is_some_and(|warehouses| warehouses.contains_key(warehouse));
        if known {
            Ok(LedgerHandle::new(principal, warehouse.clone()))
        } else {
            Err(CatalogError::UnknownWarehouse(warehouse.clone()))
        }
    }

    fn notify_activity(&self, handle: &LedgerHandle, at: DateTime<Utc>) {
        let Ok(mut inner) = self.inner.write() else {
            tracing::warn!(ledger = %handle, "activity notification dropped: catalog lock poisoned");
            return;
        };
        match inner
            .get_mut(&handle.principal())
            .and_then(|warehouses| warehouses.get_mut(handle.warehouse()))
        {
            Some(slot) => *slot = Some(at),
            None => {
                tracing::warn!(ledger = %handle, "activity notification for unregistered warehouse");
            }
        }
    }
}
