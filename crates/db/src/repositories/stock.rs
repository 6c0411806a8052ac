//! Stock repository: variants, lots, movements and stock adjustments.
//!
//! Every write runs the core `StockBook` against a locked working set and
//! persists the resulting change set in the same database transaction.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use stockflow_core::stock::{
    CountAdjustment, Lot, Movement, Replay, ReversalEngine, StockAggregator, StockCount,
    StockError, StockIn, StockInRequest, StockOut, StockReference, VariantStock,
};
use stockflow_shared::types::{DirectPlacementId, StockopnameId, VariantId};
use tracing::{info, instrument, warn};

use super::ledger;
use crate::entities::{
    direct_placements, item_variants, lots, sea_orm_active_enums::ReferenceKind, stock_movements,
    stockopnames,
};

fn database(err: DbErr) -> StockError {
    StockError::Database(err.to_string())
}

/// Input for creating an item variant.
#[derive(Debug, Clone)]
pub struct CreateVariantInput {
    /// Stock keeping unit, unique across variants.
    pub sku: String,
    /// Display name.
    pub name: String,
}

/// A direct placement and the lot it created.
#[derive(Debug, Clone)]
pub struct DirectPlacementRecord {
    /// The stored document.
    pub placement: direct_placements::Model,
    /// The new lot and its inbound movement.
    pub stock: StockIn,
}

/// A stock opname and the adjustment it caused.
#[derive(Debug, Clone)]
pub struct StockopnameRecord {
    /// The stored document.
    pub stockopname: stockopnames::Model,
    /// What the count changed.
    pub adjustment: CountAdjustment,
}

/// Repository for the stock ledger.
#[derive(Debug, Clone)]
pub struct StockRepository {
    db: DatabaseConnection,
}

impl StockRepository {
    /// Creates a new stock repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an item variant with no stock.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the insert fails, including a duplicate SKU.
    pub async fn create_variant(
        &self,
        input: CreateVariantInput,
    ) -> Result<item_variants::Model, StockError> {
        let now = Utc::now().into();
        let variant = item_variants::ActiveModel {
            id: Set(VariantId::new().into_inner()),
            sku: Set(input.sku),
            name: Set(input.name),
            available_stock: Set(0),
            committed_stock: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(database)?;

        info!(variant_id = %variant.id, sku = %variant.sku, "variant created");
        Ok(variant)
    }

    /// Current stock position of a variant.
    ///
    /// # Errors
    ///
    /// Returns `VariantNotFound` if the variant does not exist.
    pub async fn variant_stock(&self, variant_id: VariantId) -> Result<VariantStock, StockError> {
        let variant = item_variants::Entity::find_by_id(variant_id.into_inner())
            .one(&self.db)
            .await
            .map_err(database)?
            .ok_or(StockError::VariantNotFound(variant_id))?;
        Ok(VariantStock::from(&variant))
    }

    /// Sets the committed stock of a variant.
    ///
    /// Reservations are owned by the documents that make them; this only
    /// records the resulting counter.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` for a negative quantity
    /// - `VariantNotFound` if the variant does not exist
    pub async fn set_committed(
        &self,
        variant_id: VariantId,
        committed: i64,
    ) -> Result<VariantStock, StockError> {
        if committed < 0 {
            return Err(StockError::InvalidQuantity(committed));
        }
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = item_variants::Entity::update_many()
            .col_expr(item_variants::Column::CommittedStock, Expr::value(committed))
            .col_expr(item_variants::Column::UpdatedAt, Expr::value(now))
            .filter(item_variants::Column::Id.eq(variant_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(database)?;
        if result.rows_affected == 0 {
            return Err(StockError::VariantNotFound(variant_id));
        }
        self.variant_stock(variant_id).await
    }

    /// Lots of a variant in FIFO order, drained lots included.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn lots_for_variant(&self, variant_id: VariantId) -> Result<Vec<Lot>, StockError> {
        let rows = lots::Entity::find()
            .filter(lots::Column::VariantId.eq(variant_id.into_inner()))
            .order_by_asc(lots::Column::CreatedAt)
            .order_by_asc(lots::Column::Id)
            .all(&self.db)
            .await
            .map_err(database)?;
        Ok(rows.into_iter().map(Lot::from).collect())
    }

    /// Every movement recorded for a document, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn movements_for(
        &self,
        reference: StockReference,
    ) -> Result<Vec<Movement>, StockError> {
        let rows = stock_movements::Entity::find()
            .filter(
                stock_movements::Column::ReferenceKind.eq(ReferenceKind::from(reference.kind())),
            )
            .filter(stock_movements::Column::ReferenceId.eq(reference.id()))
            .order_by_asc(stock_movements::Column::CreatedAt)
            .order_by_asc(stock_movements::Column::LotId)
            .order_by_asc(stock_movements::Column::Sequence)
            .all(&self.db)
            .await
            .map_err(database)?;
        Ok(rows.into_iter().map(Movement::from).collect())
    }

    /// Receives stock into a new lot.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` / `InvalidUnitCost` on bad input
    /// - `VariantNotFound` if the variant does not exist
    #[instrument(skip(self, request), fields(variant_id = %request.variant_id))]
    pub async fn stock_in(&self, request: StockInRequest) -> Result<StockIn, StockError> {
        let txn = self.db.begin().await.map_err(database)?;
        let mut book = ledger::load_book(&txn, &[request.variant_id])
            .await
            .map_err(database)?;

        let stock_in = book.stock_in(request, Utc::now())?;

        ledger::apply_changes(&txn, &book.take_changes())
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(lot_id = %stock_in.lot.id, quantity = stock_in.movement.quantity, "stock received");
        Ok(stock_in)
    }

    /// Draws stock from a variant's lots in FIFO order.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` for a non-positive quantity
    /// - `VariantNotFound` if the variant does not exist
    /// - `InsufficientStock` if the lots hold less than requested; nothing is written
    #[instrument(skip(self))]
    pub async fn stock_out(
        &self,
        variant_id: VariantId,
        quantity: i64,
        reference: StockReference,
    ) -> Result<StockOut, StockError> {
        let txn = self.db.begin().await.map_err(database)?;
        let mut book = ledger::load_book(&txn, &[variant_id])
            .await
            .map_err(database)?;

        let stock_out = book
            .stock_out(variant_id, quantity, reference, Utc::now())
            .inspect_err(|err| warn!(error = %err, "stock-out rejected"))?;

        ledger::apply_changes(&txn, &book.take_changes())
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(lots = stock_out.movements.len(), cost = %stock_out.cost, "stock issued");
        Ok(stock_out)
    }

    /// Checks that every movement of a document can still be reversed.
    ///
    /// # Errors
    ///
    /// - `MovementsNotFound` / `AlreadyReversed` if there is nothing to reverse
    /// - `StockAlreadyConsumed` if a lot was drained since
    pub async fn check_reversal(&self, reference: StockReference) -> Result<(), StockError> {
        let book = ledger::load_book_for_references(&self.db, &[reference])
            .await
            .map_err(database)?;
        ReversalEngine::check(&book, reference).map(|_| ())
    }

    /// Reverses every movement of a document with compensating movements.
    ///
    /// # Errors
    ///
    /// - `MovementsNotFound` / `AlreadyReversed` if there is nothing to reverse
    /// - `StockAlreadyConsumed` if a lot was drained since; nothing is written
    #[instrument(skip(self))]
    pub async fn reverse(&self, reference: StockReference) -> Result<Vec<Movement>, StockError> {
        let txn = self.db.begin().await.map_err(database)?;
        let mut book = ledger::load_book_for_references(&txn, &[reference])
            .await
            .map_err(database)?;

        let movements = ReversalEngine::reverse(&mut book, reference, Utc::now())
            .inspect_err(|err| warn!(error = %err, "reversal rejected"))?;

        ledger::apply_changes(&txn, &book.take_changes())
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(movements = movements.len(), "movements reversed");
        Ok(movements)
    }

    /// Places stock directly, without a purchase order.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` / `InvalidUnitCost` on bad input
    /// - `VariantNotFound` if the variant does not exist
    #[instrument(skip(self, note))]
    pub async fn record_direct_placement(
        &self,
        variant_id: VariantId,
        quantity: i64,
        unit_cost: Decimal,
        note: Option<String>,
    ) -> Result<DirectPlacementRecord, StockError> {
        let txn = self.db.begin().await.map_err(database)?;
        let mut book = ledger::load_book(&txn, &[variant_id])
            .await
            .map_err(database)?;

        let now = Utc::now();
        let id = DirectPlacementId::new();
        let stock = book.stock_in(
            StockInRequest {
                variant_id,
                quantity,
                unit_cost,
                reference: StockReference::DirectPlacement(id),
            },
            now,
        )?;

        let placement = direct_placements::ActiveModel {
            id: Set(id.into_inner()),
            variant_id: Set(variant_id.into_inner()),
            quantity: Set(quantity),
            unit_cost: Set(unit_cost),
            note: Set(note),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(database)?;
        ledger::apply_changes(&txn, &book.take_changes())
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(placement_id = %id, lot_id = %stock.lot.id, "direct placement recorded");
        Ok(DirectPlacementRecord { placement, stock })
    }

    /// Records a physical count and adjusts the ledger to it.
    ///
    /// A surplus is received into a new lot at `unit_cost`; a shortage is
    /// drawn from the oldest lots.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` for a negative count
    /// - `VariantNotFound` if the variant does not exist
    #[instrument(skip(self, note))]
    pub async fn record_stockopname(
        &self,
        variant_id: VariantId,
        counted: i64,
        unit_cost: Decimal,
        note: Option<String>,
    ) -> Result<StockopnameRecord, StockError> {
        let txn = self.db.begin().await.map_err(database)?;
        let mut book = ledger::load_book(&txn, &[variant_id])
            .await
            .map_err(database)?;

        let now = Utc::now();
        let id = StockopnameId::new();
        let recorded = book.available(variant_id);
        let adjustment = StockCount::adjust(
            &mut book,
            variant_id,
            counted,
            unit_cost,
            StockReference::Stockopname(id),
            now,
        )?;

        let stockopname = stockopnames::ActiveModel {
            id: Set(id.into_inner()),
            variant_id: Set(variant_id.into_inner()),
            recorded_quantity: Set(recorded),
            counted_quantity: Set(counted),
            note: Set(note),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(database)?;
        ledger::apply_changes(&txn, &book.take_changes())
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(stockopname_id = %id, recorded, counted, "stock opname recorded");
        Ok(StockopnameRecord {
            stockopname,
            adjustment,
        })
    }

    /// Recomputes lot and variant caches by replaying the movement ledger.
    ///
    /// Rebuilds one variant, or every variant when `variant_id` is `None`.
    ///
    /// # Errors
    ///
    /// - `VariantNotFound` if the given variant does not exist
    /// - `IntegrityViolation` if the ledger drives a lot below zero; nothing is written
    #[instrument(skip(self))]
    pub async fn rebuild_aggregates(
        &self,
        variant_id: Option<VariantId>,
    ) -> Result<Replay, StockError> {
        let txn = self.db.begin().await.map_err(database)?;

        let mut variants = item_variants::Entity::find();
        let mut lot_query = lots::Entity::find();
        if let Some(variant_id) = variant_id {
            variants = variants.filter(item_variants::Column::Id.eq(variant_id.into_inner()));
            lot_query = lot_query.filter(lots::Column::VariantId.eq(variant_id.into_inner()));
        }
        let variants = ledger::for_update(&txn, variants)
            .all(&txn)
            .await
            .map_err(database)?;
        if let Some(variant_id) = variant_id
            && variants.is_empty()
        {
            return Err(StockError::VariantNotFound(variant_id));
        }

        let lot_rows = ledger::for_update(&txn, lot_query)
            .all(&txn)
            .await
            .map_err(database)?;
        let history = ledger::load_history(&txn, lot_rows.iter().map(|lot| lot.id).collect())
            .await
            .map_err(database)?;
        let lots: Vec<Lot> = lot_rows.into_iter().map(Lot::from).collect();
        let movements: Vec<Movement> = history.into_values().flatten().collect();

        let replay = StockAggregator::replay(&lots, &movements)
            .inspect_err(|err| warn!(error = %err, "ledger replay failed"))?;

        for lot in &lots {
            let remaining = replay.lot_remaining.get(&lot.id).copied().unwrap_or(0);
            if remaining != lot.remaining {
                warn!(lot_id = %lot.id, cached = lot.remaining, remaining, "lot cache drifted");
            }
            ledger::write_lot_remaining(&txn, lot.id.into_inner(), remaining)
                .await
                .map_err(database)?;
        }

        let available: BTreeMap<VariantId, i64> = variants
            .iter()
            .map(|variant| {
                let id = VariantId::from_uuid(variant.id);
                (id, replay.variant_available.get(&id).copied().unwrap_or(0))
            })
            .collect();
        for (id, quantity) in &available {
            ledger::write_variant_available(&txn, id.into_inner(), *quantity)
                .await
                .map_err(database)?;
        }
        txn.commit().await.map_err(database)?;

        info!(variants = available.len(), lots = lots.len(), "stock aggregates rebuilt");
        Ok(Replay {
            lot_remaining: replay.lot_remaining,
            variant_available: available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_maps_to_internal() {
        let err = database(DbErr::Custom("connection reset".to_string()));
        assert!(matches!(err, StockError::Database(ref msg) if msg.contains("connection reset")));
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_reference_kind_round_trips_through_column_enum() {
        let kind = stockflow_core::stock::ReferenceKind::DirectPlacement;
        let column = ReferenceKind::from(kind);
        assert_eq!(column, ReferenceKind::DirectPlacement);
        assert_eq!(stockflow_core::stock::ReferenceKind::from(column), kind);
    }
}
