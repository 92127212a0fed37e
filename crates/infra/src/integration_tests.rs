//! Integration tests for the full ledger pipeline.
//!
//! Tests: Session -> Catalog -> Engine / Coordinator -> WarehouseStore
//!
//! Verifies:
//! - appended rows carry correct running totals per product
//! - mid-sequence edits and deletes cascade or are refused atomically
//! - shifts convert planned trades in one all-or-nothing step
//! - sessions and warehouse registration gate every operation

use std::sync::Arc;

use chrono::NaiveDate;

use stockforge_auth::{FixedSession, NoSession, Principal, SharedSession};
use stockforge_core::{MovementId, PlannedTradeId, PrincipalId, ProductName, WarehouseName};
use stockforge_ledger::{Leg, Movement, MovementDraft, MovementSide, PlannedTradeDraft};

use crate::catalog::InMemoryCatalog;
use crate::engine::{EngineError, LedgerEngine};
use crate::shift::ShiftCoordinator;
use crate::store::InMemoryWarehouseStore;

type TestEngine = LedgerEngine<Arc<InMemoryWarehouseStore>, Arc<InMemoryCatalog>, FixedSession>;
type TestCoordinator =
    ShiftCoordinator<Arc<InMemoryWarehouseStore>, Arc<InMemoryCatalog>, FixedSession>;

struct Fixture {
    engine: TestEngine,
    coordinator: TestCoordinator,
    store: Arc<InMemoryWarehouseStore>,
    catalog: Arc<InMemoryCatalog>,
    principal: PrincipalId,
}

fn warehouse() -> WarehouseName {
    WarehouseName::new("central").unwrap()
}

fn beans() -> ProductName {
    ProductName::new("beans").unwrap()
}

fn rice() -> ProductName {
    ProductName::new("rice").unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn import(qty: i64) -> MovementDraft {
    MovementDraft::import(beans(), Leg::new(qty, 100), date())
}

fn export(qty: i64) -> MovementDraft {
    MovementDraft::export(beans(), Leg::new(qty, 100), date())
}

fn setup() -> Fixture {
    let store = Arc::new(InMemoryWarehouseStore::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    let principal = PrincipalId::new();
    catalog.register(principal, warehouse());

    let session = FixedSession::new(Principal::new(principal, "operator"));
    let engine = LedgerEngine::new(store.clone(), catalog.clone(), session.clone());
    let coordinator = ShiftCoordinator::new(store.clone(), catalog.clone(), session);

    Fixture {
        engine,
        coordinator,
        store,
        catalog,
        principal,
    }
}

/// Second operator over the same store and catalog.
fn second_operator(fx: &Fixture) -> (TestEngine, TestCoordinator) {
    let principal = PrincipalId::new();
    fx.catalog.register(principal, warehouse());
    let session = FixedSession::new(Principal::new(principal, "colleague"));
    let engine = LedgerEngine::new(fx.store.clone(), fx.catalog.clone(), session.clone());
    let coordinator = ShiftCoordinator::new(fx.store.clone(), fx.catalog.clone(), session);
    (engine, coordinator)
}

fn snapshot(engine: &TestEngine) -> Vec<Movement> {
    engine.movements(&warehouse()).unwrap()
}

// Appends

#[test]
fn append_assigns_sequential_ids_and_running_totals() {
    let fx = setup();

    let a = fx.engine.append(&warehouse(), import(10)).unwrap();
    let b = fx.engine.append(&warehouse(), import(5)).unwrap();
    let c = fx.engine.append(&warehouse(), export(12)).unwrap();

    assert_eq!(a.id, MovementId::new(1));
    assert_eq!(b.id, MovementId::new(2));
    assert_eq!(c.id, MovementId::new(3));
    assert_eq!(a.running_total, 10);
    assert_eq!(b.running_total, 15);
    assert_eq!(c.running_total, 3);
    assert_eq!(fx.engine.current_total(&warehouse(), &beans()).unwrap(), 3);
}

#[test]
fn running_totals_are_tracked_per_product() {
    let fx = setup();

    fx.engine.append(&warehouse(), import(10)).unwrap();
    let rice_row = fx
        .engine
        .append(
            &warehouse(),
            MovementDraft::import(rice(), Leg::new(4, 50), date()),
        )
        .unwrap();
    let beans_export = fx.engine.append(&warehouse(), export(6)).unwrap();

    assert_eq!(rice_row.running_total, 4);
    assert_eq!(beans_export.running_total, 4);
    assert_eq!(fx.engine.current_total(&warehouse(), &rice()).unwrap(), 4);
    assert_eq!(fx.engine.current_total(&warehouse(), &beans()).unwrap(), 4);
}

#[test]
fn listing_is_read_only_and_stable() {
    let fx = setup();
    fx.engine.append(&warehouse(), import(10)).unwrap();
    fx.engine.append(&warehouse(), export(4)).unwrap();
    fx.engine
        .append(
            &warehouse(),
            MovementDraft::import(rice(), Leg::new(7, 50), date()),
        )
        .unwrap();

    let first = fx.engine.movements(&warehouse()).unwrap();
    let second = fx.engine.movements(&warehouse()).unwrap();

    assert_eq!(first, second);
    let ids: Vec<_> = first.iter().map(|row| row.id).collect();
    assert_eq!(
        ids,
        vec![MovementId::new(1), MovementId::new(2), MovementId::new(3)]
    );
}

#[test]
fn export_beyond_stock_is_refused_and_writes_nothing() {
    let fx = setup();
    fx.engine.append(&warehouse(), import(5)).unwrap();
    let before = snapshot(&fx.engine);

    let err = fx.engine.append(&warehouse(), export(6)).unwrap_err();
    match err {
        EngineError::InsufficientStock {
            product,
            requested,
            available,
        } => {
            assert_eq!(product, beans());
            assert_eq!(requested, 6);
            assert_eq!(available, 5);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    assert_eq!(snapshot(&fx.engine), before);
}

#[test]
fn export_may_drain_stock_to_zero() {
    let fx = setup();
    fx.engine.append(&warehouse(), import(5)).unwrap();
    let row = fx.engine.append(&warehouse(), export(5)).unwrap();

    assert_eq!(row.running_total, 0);
    assert_eq!(fx.engine.current_total(&warehouse(), &beans()).unwrap(), 0);
}

#[test]
fn append_validates_drafts() {
    let fx = setup();

    let err = fx.engine.append(&warehouse(), import(0)).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(snapshot(&fx.engine).is_empty());
}

// Deletes

#[test]
fn deleting_an_import_other_exports_depend_on_is_refused() {
    let fx = setup();
    fx.engine.append(&warehouse(), import(10)).unwrap();
    let b = fx.engine.append(&warehouse(), import(5)).unwrap();
    let c = fx.engine.append(&warehouse(), export(12)).unwrap();
    let before = snapshot(&fx.engine);

    let err = fx.engine.delete(&warehouse(), b.id).unwrap_err();
    match err {
        EngineError::NegativeStock { id, projected } => {
            assert_eq!(id, c.id);
            assert_eq!(projected, -2);
        }
        other => panic!("expected negative stock, got {other:?}"),
    }

    assert_eq!(snapshot(&fx.engine), before);
}

#[test]
fn deleting_a_clear_import_rewrites_later_totals() {
    let fx = setup();
    let a = fx.engine.append(&warehouse(), import(10)).unwrap();
    let b = fx.engine.append(&warehouse(), import(5)).unwrap();
    let c = fx.engine.append(&warehouse(), export(3)).unwrap();

    fx.engine.delete(&warehouse(), b.id).unwrap();

    let rows = snapshot(&fx.engine);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, a.id);
    assert_eq!(rows[0].running_total, 10);
    assert_eq!(rows[1].id, c.id);
    assert_eq!(rows[1].running_total, 7);
}

#[test]
fn deleting_the_tail_row_does_not_reuse_its_id() {
    let fx = setup();
    let a = fx.engine.append(&warehouse(), import(10)).unwrap();
    fx.engine.delete(&warehouse(), a.id).unwrap();

    let b = fx.engine.append(&warehouse(), import(4)).unwrap();
    assert_eq!(b.id, MovementId::new(2));
}

#[test]
fn delete_of_missing_row_is_not_found() {
    let fx = setup();
    let err = fx
        .engine
        .delete(&warehouse(), MovementId::new(9))
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound));
}

// Updates

#[test]
fn updating_quantity_cascades_to_later_rows() {
    let fx = setup();
    let a = fx.engine.append(&warehouse(), import(10)).unwrap();
    let b = fx.engine.append(&warehouse(), export(4)).unwrap();
    let c = fx.engine.append(&warehouse(), export(2)).unwrap();

    let updated = fx.engine.update(&warehouse(), a.id, import(20)).unwrap();
    assert_eq!(updated.running_total, 20);

    let rows = snapshot(&fx.engine);
    assert_eq!(rows[0].running_total, 20);
    assert_eq!(rows[1].id, b.id);
    assert_eq!(rows[1].running_total, 16);
    assert_eq!(rows[2].id, c.id);
    assert_eq!(rows[2].running_total, 14);
}

#[test]
fn update_refused_when_a_later_export_would_go_negative() {
    let fx = setup();
    let a = fx.engine.append(&warehouse(), import(10)).unwrap();
    let b = fx.engine.append(&warehouse(), export(8)).unwrap();
    let before = snapshot(&fx.engine);

    let err = fx.engine.update(&warehouse(), a.id, import(5)).unwrap_err();
    match err {
        EngineError::NegativeStock { id, projected } => {
            assert_eq!(id, b.id);
            assert_eq!(projected, -3);
        }
        other => panic!("expected negative stock, got {other:?}"),
    }

    assert_eq!(snapshot(&fx.engine), before);
}

#[test]
fn renaming_a_row_recomputes_both_products() {
    let fx = setup();
    fx.engine.append(&warehouse(), import(10)).unwrap();
    let b = fx.engine.append(&warehouse(), import(8)).unwrap();
    let c = fx.engine.append(&warehouse(), export(5)).unwrap();

    let renamed = fx
        .engine
        .update(
            &warehouse(),
            b.id,
            MovementDraft::import(rice(), Leg::new(8, 100), date()),
        )
        .unwrap();
    assert_eq!(renamed.product, rice());
    assert_eq!(renamed.running_total, 8);

    let rows = snapshot(&fx.engine);
    assert_eq!(rows[0].running_total, 10);
    assert_eq!(rows[1].product, rice());
    assert_eq!(rows[1].running_total, 8);
    // The export now follows the first import directly.
    assert_eq!(rows[2].id, c.id);
    assert_eq!(rows[2].running_total, 5);
}

#[test]
fn rename_that_strands_exports_is_refused() {
    let fx = setup();
    let a = fx.engine.append(&warehouse(), import(10)).unwrap();
    let b = fx.engine.append(&warehouse(), export(6)).unwrap();
    let before = snapshot(&fx.engine);

    let err = fx
        .engine
        .update(
            &warehouse(),
            a.id,
            MovementDraft::import(rice(), Leg::new(10, 100), date()),
        )
        .unwrap_err();
    match err {
        EngineError::NegativeStock { id, projected } => {
            assert_eq!(id, b.id);
            assert_eq!(projected, -6);
        }
        other => panic!("expected negative stock, got {other:?}"),
    }

    assert_eq!(snapshot(&fx.engine), before);
}

#[test]
fn update_of_missing_row_is_not_found() {
    let fx = setup();
    let err = fx
        .engine
        .update(&warehouse(), MovementId::new(3), import(1))
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound));
}

// Sessions and warehouses

#[test]
fn unauthenticated_sessions_are_refused() {
    let fx = setup();
    let engine = LedgerEngine::new(fx.store.clone(), fx.catalog.clone(), NoSession);
    let coordinator = ShiftCoordinator::new(fx.store.clone(), fx.catalog.clone(), NoSession);

    assert!(matches!(
        engine.append(&warehouse(), import(1)).unwrap_err(),
        EngineError::Unauthenticated
    ));
    assert!(matches!(
        engine.movements(&warehouse()).unwrap_err(),
        EngineError::Unauthenticated
    ));
    assert!(matches!(
        engine.delete(&warehouse(), MovementId::new(1)).unwrap_err(),
        EngineError::Unauthenticated
    ));
    assert!(matches!(
        coordinator.planned_trades().unwrap_err(),
        EngineError::Unauthenticated
    ));
    assert!(matches!(
        coordinator.shift(PlannedTradeId::new(1)).unwrap_err(),
        EngineError::Unauthenticated
    ));
}

#[test]
fn signing_out_revokes_access() {
    let fx = setup();
    let session = Arc::new(SharedSession::signed_in(Principal::new(
        fx.principal,
        "operator",
    )));
    let engine = LedgerEngine::new(fx.store.clone(), fx.catalog.clone(), session.clone());

    engine.append(&warehouse(), import(3)).unwrap();
    session.sign_out();

    assert!(matches!(
        engine.append(&warehouse(), import(3)).unwrap_err(),
        EngineError::Unauthenticated
    ));
}

#[test]
fn operations_require_a_registered_warehouse() {
    let fx = setup();
    let dockside = WarehouseName::new("dockside").unwrap();

    let err = fx.engine.append(&dockside, import(1)).unwrap_err();
    assert!(matches!(err, EngineError::UnknownWarehouse(name) if name == dockside));
}

#[test]
fn ledgers_are_isolated_per_principal() {
    let fx = setup();
    let (other_engine, _) = second_operator(&fx);

    fx.engine.append(&warehouse(), import(10)).unwrap();
    other_engine.append(&warehouse(), import(3)).unwrap();

    let mine = snapshot(&fx.engine);
    let theirs = other_engine.movements(&warehouse()).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(theirs.len(), 1);
    assert_eq!(mine[0].running_total, 10);
    assert_eq!(theirs[0].running_total, 3);
}

// Planned trades

fn planned_import(qty: i64) -> PlannedTradeDraft {
    PlannedTradeDraft::import_only(warehouse(), beans(), Leg::new(qty, 100), date())
}

fn planned_export(qty: i64) -> PlannedTradeDraft {
    PlannedTradeDraft::export_only(warehouse(), beans(), Leg::new(qty, 100), date())
}

#[test]
fn planned_trades_get_sequential_ids_per_principal() {
    let fx = setup();
    let (_, other_coordinator) = second_operator(&fx);

    let first = fx.coordinator.add(planned_import(1)).unwrap();
    let second = fx.coordinator.add(planned_import(2)).unwrap();
    let other_first = other_coordinator.add(planned_import(3)).unwrap();

    assert_eq!(first.id, PlannedTradeId::new(1));
    assert_eq!(second.id, PlannedTradeId::new(2));
    assert_eq!(other_first.id, PlannedTradeId::new(1));
}

#[test]
fn removing_the_newest_planned_trade_frees_its_id() {
    let fx = setup();
    fx.coordinator.add(planned_import(1)).unwrap();
    let second = fx.coordinator.add(planned_import(2)).unwrap();

    fx.coordinator.remove(second.id).unwrap();
    let replacement = fx.coordinator.add(planned_import(9)).unwrap();

    assert_eq!(replacement.id, second.id);
}

#[test]
fn planned_trade_update_replaces_fields() {
    let fx = setup();
    let trade = fx.coordinator.add(planned_import(5)).unwrap();

    let mut draft = planned_export(2);
    draft.customer = Some("mill".to_string());
    let updated = fx.coordinator.update(trade.id, draft).unwrap();

    assert_eq!(updated.id, trade.id);
    assert_eq!(updated.import, None);
    assert_eq!(updated.export, Some(Leg::new(2, 100)));

    let fetched = fx.coordinator.planned_trade(trade.id).unwrap();
    assert_eq!(fetched, updated);
}

#[test]
fn planned_trade_lookups_miss_cleanly() {
    let fx = setup();
    let missing = PlannedTradeId::new(7);

    assert!(matches!(
        fx.coordinator.planned_trade(missing).unwrap_err(),
        EngineError::NotFound
    ));
    assert!(matches!(
        fx.coordinator.update(missing, planned_import(1)).unwrap_err(),
        EngineError::NotFound
    ));
    assert!(matches!(
        fx.coordinator.remove(missing).unwrap_err(),
        EngineError::NotFound
    ));
}

#[test]
fn planned_trades_are_scoped_to_their_owner() {
    let fx = setup();
    let (_, other_coordinator) = second_operator(&fx);
    let trade = fx.coordinator.add(planned_import(5)).unwrap();

    assert!(other_coordinator.planned_trades().unwrap().is_empty());
    assert!(matches!(
        other_coordinator.planned_trade(trade.id).unwrap_err(),
        EngineError::NotFound
    ));
    assert!(matches!(
        other_coordinator.remove(trade.id).unwrap_err(),
        EngineError::NotFound
    ));
    assert_eq!(fx.coordinator.planned_trades().unwrap().len(), 1);
}

// Shifts

#[test]
fn shifting_a_two_leg_trade_fills_both_rows() {
    let fx = setup();
    let draft = PlannedTradeDraft {
        warehouse: warehouse(),
        product: beans(),
        supplier: Some("acme".to_string()),
        customer: Some("mill".to_string()),
        import: Some(Leg::new(10, 100)),
        export: Some(Leg::new(4, 120)),
        effective_date: date(),
    };
    let trade = fx.coordinator.add(draft).unwrap();

    let rows = fx.coordinator.shift(trade.id).unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows[0].side.is_import());
    assert_eq!(rows[0].running_total, 10);
    assert_eq!(rows[0].supplier.as_deref(), Some("acme"));
    assert_eq!(rows[0].customer, None);
    assert!(rows[1].side.is_export());
    assert_eq!(rows[1].running_total, 6);
    assert_eq!(rows[1].customer.as_deref(), Some("mill"));
    assert!(rows[0].id < rows[1].id);

    assert_eq!(fx.engine.current_total(&warehouse(), &beans()).unwrap(), 6);
    assert!(fx.coordinator.planned_trades().unwrap().is_empty());
}

#[test]
fn shift_export_can_spend_the_import_leg() {
    let fx = setup();
    fx.engine.append(&warehouse(), import(3)).unwrap();

    let mut draft = planned_import(2);
    draft.export = Some(Leg::new(5, 100));
    let trade = fx.coordinator.add(draft).unwrap();

    let rows = fx.coordinator.shift(trade.id).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].running_total, 0);
}

#[test]
fn shift_refused_when_export_leg_exceeds_stock() {
    let fx = setup();
    let trade = fx.coordinator.add(planned_export(4)).unwrap();

    let err = fx.coordinator.shift(trade.id).unwrap_err();
    match err {
        EngineError::InsufficientStock {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, 4);
            assert_eq!(available, 0);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    // The failed shift left both sides untouched.
    assert!(snapshot(&fx.engine).is_empty());
    assert_eq!(fx.coordinator.planned_trades().unwrap().len(), 1);
}

#[test]
fn shift_with_one_leg_creates_one_row() {
    let fx = setup();
    let trade = fx.coordinator.add(planned_import(7)).unwrap();

    let rows = fx.coordinator.shift(trade.id).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].side, MovementSide::Import(Leg::new(7, 100)));
    assert_eq!(rows[0].running_total, 7);
    assert!(fx.coordinator.planned_trades().unwrap().is_empty());
}

#[test]
fn shifting_a_legless_trade_only_removes_it() {
    let fx = setup();
    let draft = PlannedTradeDraft {
        warehouse: warehouse(),
        product: beans(),
        supplier: None,
        customer: None,
        import: None,
        export: None,
        effective_date: date(),
    };
    let trade = fx.coordinator.add(draft).unwrap();

    let rows = fx.coordinator.shift(trade.id).unwrap();

    assert!(rows.is_empty());
    assert!(snapshot(&fx.engine).is_empty());
    assert!(fx.coordinator.planned_trades().unwrap().is_empty());
}

#[test]
fn shift_of_missing_trade_is_not_found() {
    let fx = setup();
    assert!(matches!(
        fx.coordinator.shift(PlannedTradeId::new(4)).unwrap_err(),
        EngineError::NotFound
    ));
}

#[test]
fn shift_requires_the_trades_warehouse_to_exist() {
    let fx = setup();
    let dockside = WarehouseName::new("dockside").unwrap();
    let draft = PlannedTradeDraft::import_only(dockside.clone(), beans(), Leg::new(2, 100), date());
    let trade = fx.coordinator.add(draft).unwrap();

    let err = fx.coordinator.shift(trade.id).unwrap_err();
    assert!(matches!(err, EngineError::UnknownWarehouse(name) if name == dockside));
    // The trade is kept so it can be retargeted or removed.
    assert_eq!(fx.coordinator.planned_trades().unwrap().len(), 1);
}

// Warehouse activity

#[test]
fn committed_changes_update_warehouse_activity() {
    let fx = setup();
    assert_eq!(fx.catalog.last_activity(fx.principal, &warehouse()), None);

    fx.engine.append(&warehouse(), import(5)).unwrap();
    let after_append = fx.catalog.last_activity(fx.principal, &warehouse());
    assert!(after_append.is_some());

    // A refused mutation leaves the mark untouched.
    fx.engine.append(&warehouse(), export(9)).unwrap_err();
    assert_eq!(
        fx.catalog.last_activity(fx.principal, &warehouse()),
        after_append
    );
}

#[test]
fn legless_shift_does_not_mark_warehouse_activity() {
    let fx = setup();
    let draft = PlannedTradeDraft {
        warehouse: warehouse(),
        product: beans(),
        supplier: None,
        customer: None,
        import: None,
        export: None,
        effective_date: date(),
    };
    let trade = fx.coordinator.add(draft).unwrap();

    fx.coordinator.shift(trade.id).unwrap();
    assert_eq!(fx.catalog.last_activity(fx.principal, &warehouse()), None);
}
