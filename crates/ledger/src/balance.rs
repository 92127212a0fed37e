use stockforge_core::{DomainError, DomainResult, MovementId};

use crate::movement::{Movement, MovementDraft, MovementSide, NewMovement};

/// Corrected running total for one already-stored row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TotalUpdate {
    pub id: MovementId,
    pub running_total: i64,
}

/// Replays `rows` on top of `base` and returns the corrected running total
/// for every row. Input must be the rows of a single product in ascending
/// id order; their stored totals are ignored and recomputed from deltas.
///
/// Fails with [`DomainError::NegativeStock`] at the first row whose
/// projected total would drop below zero. Nothing is written here; callers
/// commit the returned updates in one batch or discard them entirely.
pub fn recalculate(base: i64, rows: &[Movement]) -> DomainResult<Vec<TotalUpdate>> {
    debug_assert!(
        rows.windows(2).all(|pair| pair[0].id < pair[1].id),
        "recalculation input must be sorted by id"
    );

    let mut running = base;
    let mut updates = Vec::with_capacity(rows.len());
    for row in rows {
        running += row.delta();
        if running < 0 {
            return Err(DomainError::NegativeStock {
                id: row.id,
                projected: running,
            });
        }
        updates.push(TotalUpdate {
            id: row.id,
            running_total: running,
        });
    }
    Ok(updates)
}

/// Validates `draft` against the product's current total and turns it into
/// a row ready for insertion at the tail of the ledger.
///
/// An export may take the total to exactly zero but not below; the tail is
/// by definition the latest state of the product, so no replay is needed.
pub fn plan_append(current_total: i64, draft: MovementDraft) -> DomainResult<NewMovement> {
    draft.validate()?;

    let running_total = match draft.side {
        MovementSide::Import(leg) => current_total + leg.quantity,
        MovementSide::Export(leg) => {
            if leg.quantity > current_total {
                return Err(DomainError::InsufficientStock {
                    product: draft.product,
                    requested: leg.quantity,
                    available: current_total,
                });
            }
            current_total - leg.quantity
        }
    };

    Ok(NewMovement {
        product: draft.product,
        supplier: draft.supplier,
        customer: draft.customer,
        side: draft.side,
        running_total,
        effective_date: draft.effective_date,
    })
}
