//! Loading and persisting the stock working set.
//!
//! Every stock-moving workflow follows the same shape: lock and load the lots
//! and variants it may touch into a [`StockBook`], run the core workflow
//! against the book, then write the drained [`StockChanges`] back inside the
//! same transaction.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbBackend, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use stockflow_core::stock::{Lot, Movement, StockBook, StockChanges, StockReference, VariantStock};
use stockflow_shared::types::VariantId;
use uuid::Uuid;

use crate::entities::{item_variants, lots, sea_orm_active_enums::ReferenceKind, stock_movements};

/// Adds `FOR UPDATE` on backends that support row locks.
///
/// SQLite serialises writers on the whole database, so the select is left as is there.
pub(crate) fn for_update<E, C>(conn: &C, select: Select<E>) -> Select<E>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if conn.get_database_backend() == DbBackend::Postgres {
        select.lock_exclusive()
    } else {
        select
    }
}

/// Locks and loads the given variants with every lot and movement they own.
///
/// Variants that do not exist are simply absent from the book.
pub(crate) async fn load_book<C>(conn: &C, variant_ids: &[VariantId]) -> Result<StockBook, DbErr>
where
    C: ConnectionTrait,
{
    let mut book = StockBook::new();
    let ids: Vec<Uuid> = variant_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(VariantId::into_inner)
        .collect();
    if ids.is_empty() {
        return Ok(book);
    }

    let variants = for_update(
        conn,
        item_variants::Entity::find()
            .filter(item_variants::Column::Id.is_in(ids.clone()))
            .order_by_asc(item_variants::Column::Id),
    )
    .all(conn)
    .await?;
    for variant in &variants {
        book.track_variant(VariantStock::from(variant));
    }

    let lot_rows = for_update(
        conn,
        lots::Entity::find()
            .filter(lots::Column::VariantId.is_in(ids))
            .order_by_asc(lots::Column::CreatedAt)
            .order_by_asc(lots::Column::Id),
    )
    .all(conn)
    .await?;

    let mut history = load_history(conn, lot_rows.iter().map(|lot| lot.id).collect()).await?;
    for row in lot_rows {
        let movements = history.remove(&row.id).unwrap_or_default();
        book.track_lot(Lot::from(row), movements);
    }

    tracing::debug!(variants = variants.len(), "loaded stock working set");
    Ok(book)
}

/// Locks and loads every variant touched by movements of the given references.
pub(crate) async fn load_book_for_references<C>(
    conn: &C,
    references: &[StockReference],
) -> Result<StockBook, DbErr>
where
    C: ConnectionTrait,
{
    if references.is_empty() {
        return Ok(StockBook::new());
    }

    let mut condition = Condition::any();
    for reference in references {
        condition = condition.add(
            Condition::all()
                .add(
                    stock_movements::Column::ReferenceKind
                        .eq(ReferenceKind::from(reference.kind())),
                )
                .add(stock_movements::Column::ReferenceId.eq(reference.id())),
        );
    }
    let lot_ids: Vec<Uuid> = stock_movements::Entity::find()
        .filter(condition)
        .all(conn)
        .await?
        .into_iter()
        .map(|movement| movement.lot_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if lot_ids.is_empty() {
        return Ok(StockBook::new());
    }

    let variant_ids: Vec<VariantId> = lots::Entity::find()
        .filter(lots::Column::Id.is_in(lot_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|lot| VariantId::from_uuid(lot.variant_id))
        .collect();

    load_book(conn, &variant_ids).await
}

/// Movements of the given lots, grouped per lot in sequence order.
pub(crate) async fn load_history<C>(
    conn: &C,
    lot_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<Movement>>, DbErr>
where
    C: ConnectionTrait,
{
    let mut history: HashMap<Uuid, Vec<Movement>> = HashMap::new();
    if lot_ids.is_empty() {
        return Ok(history);
    }

    let rows = stock_movements::Entity::find()
        .filter(stock_movements::Column::LotId.is_in(lot_ids))
        .order_by_asc(stock_movements::Column::LotId)
        .order_by_asc(stock_movements::Column::Sequence)
        .all(conn)
        .await?;
    for row in rows {
        history.entry(row.lot_id).or_default().push(Movement::from(row));
    }
    Ok(history)
}

/// Writes a change set: new lots, new movements, then the refreshed caches.
pub(crate) async fn apply_changes<C>(conn: &C, changes: &StockChanges) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    for lot in &changes.created_lots {
        lots::ActiveModel {
            id: Set(lot.id.into_inner()),
            variant_id: Set(lot.variant_id.into_inner()),
            code: Set(lot.code.clone()),
            unit_cost: Set(lot.unit_cost),
            remaining: Set(lot.remaining),
            created_at: Set(lot.created_at.into()),
        }
        .insert(conn)
        .await?;
    }

    for movement in &changes.movements {
        stock_movements::ActiveModel::from(movement).insert(conn).await?;
    }

    for lot in &changes.updated_lots {
        write_lot_remaining(conn, lot.id.into_inner(), lot.remaining).await?;
    }

    for variant in &changes.variants {
        write_variant_available(conn, variant.variant_id.into_inner(), variant.available).await?;
    }

    Ok(())
}

pub(crate) async fn write_lot_remaining<C>(
    conn: &C,
    lot_id: Uuid,
    remaining: i64,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    lots::Entity::update_many()
        .col_expr(lots::Column::Remaining, Expr::value(remaining))
        .filter(lots::Column::Id.eq(lot_id))
        .exec(conn)
        .await?;
    Ok(())
}

pub(crate) async fn write_variant_available<C>(
    conn: &C,
    variant_id: Uuid,
    available: i64,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    item_variants::Entity::update_many()
        .col_expr(item_variants::Column::AvailableStock, Expr::value(available))
        .col_expr(item_variants::Column::UpdatedAt, Expr::value(now))
        .filter(item_variants::Column::Id.eq(variant_id))
        .exec(conn)
        .await?;
    Ok(())
}
