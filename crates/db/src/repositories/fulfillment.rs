//! Fulfillment repository: sales orders, fulfillment drafts and approval.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use stockflow_core::fulfillment::{
    ApprovalOutcome, DraftLine, Fulfillment, FulfillmentApproval, FulfillmentDraft,
    FulfillmentError, FulfillmentLine, SalesOrderLine, SalesOrderProgress,
};
use stockflow_core::DocumentStatus as Status;
use stockflow_shared::ValidationErrors;
use stockflow_shared::types::{FulfillmentId, SalesOrderId, SalesOrderItemId, VariantId};
use tracing::{info, instrument, warn};

use super::ledger;
use crate::entities::{
    fulfillment_items, fulfillments, item_variants, sales_order_items, sales_orders,
    sea_orm_active_enums::DocumentStatus,
};

fn database(err: DbErr) -> FulfillmentError {
    FulfillmentError::Database(err.to_string())
}

/// One line of a new sales order.
#[derive(Debug, Clone)]
pub struct CreateSalesOrderItemInput {
    /// Variant being sold.
    pub variant_id: VariantId,
    /// Ordered quantity, must be positive.
    pub quantity: i64,
}

/// Repository for sales orders and fulfillments.
#[derive(Debug, Clone)]
pub struct FulfillmentRepository {
    db: DatabaseConnection,
}

impl FulfillmentRepository {
    /// Creates a new fulfillment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a sales order with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when there are no items, an item quantity is not
    /// positive or an item names an unknown variant.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn create_sales_order(
        &self,
        items: Vec<CreateSalesOrderItemInput>,
    ) -> Result<SalesOrderProgress, FulfillmentError> {
        let variant_ids: Vec<_> = items
            .iter()
            .map(|item| item.variant_id.into_inner())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let known: BTreeSet<_> = if variant_ids.is_empty() {
            BTreeSet::new()
        } else {
            item_variants::Entity::find()
                .filter(item_variants::Column::Id.is_in(variant_ids))
                .all(&self.db)
                .await
                .map_err(database)?
                .into_iter()
                .map(|variant| variant.id)
                .collect()
        };

        let mut errors = ValidationErrors::new();
        if items.is_empty() {
            errors.add("items", "REQUIRED", "at least one item is required");
        }
        for (index, item) in items.iter().enumerate() {
            if item.quantity <= 0 {
                errors.add(
                    format!("items[{index}].quantity"),
                    "NOT_POSITIVE",
                    "quantity must be positive",
                );
            }
            if !known.contains(&item.variant_id.into_inner()) {
                errors.add(
                    format!("items[{index}].variant_id"),
                    "UNKNOWN_VARIANT",
                    format!("variant {} does not exist", item.variant_id),
                );
            }
        }
        errors.into_result()?;

        let now = Utc::now().into();
        let order_id = SalesOrderId::new();
        let txn = self.db.begin().await.map_err(database)?;

        sales_orders::ActiveModel {
            id: Set(order_id.into_inner()),
            status: Set(DocumentStatus::New),
            total_cost: Set(Decimal::ZERO),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(database)?;

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let id = SalesOrderItemId::new();
            sales_order_items::ActiveModel {
                id: Set(id.into_inner()),
                sales_order_id: Set(order_id.into_inner()),
                variant_id: Set(item.variant_id.into_inner()),
                quantity: Set(item.quantity),
                fulfilled_quantity: Set(0),
                is_deleted: Set(false),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(database)?;
            lines.push(SalesOrderLine {
                id,
                variant_id: item.variant_id,
                quantity: item.quantity,
                fulfilled_quantity: 0,
                is_deleted: false,
            });
        }
        txn.commit().await.map_err(database)?;

        info!(sales_order_id = %order_id, "sales order created");
        Ok(SalesOrderProgress {
            id: order_id,
            status: Status::New,
            total_cost: Decimal::ZERO,
            items: lines,
        })
    }

    /// Loads a sales order with its items.
    ///
    /// # Errors
    ///
    /// Returns `SalesOrderNotFound` if the order is missing or soft-deleted.
    pub async fn find_sales_order(
        &self,
        id: SalesOrderId,
    ) -> Result<SalesOrderProgress, FulfillmentError> {
        load_sales_order(&self.db, id, false).await
    }

    /// Drafts a fulfillment with status `new` for a sales order.
    ///
    /// # Errors
    ///
    /// - `SalesOrderNotFound` if the order is missing or soft-deleted
    /// - `Validation` carrying every failed line check
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn create_fulfillment(
        &self,
        sales_order_id: SalesOrderId,
        lines: &[DraftLine],
    ) -> Result<Fulfillment, FulfillmentError> {
        let order = load_sales_order(&self.db, sales_order_id, false).await?;
        let fulfillment = FulfillmentDraft::create(&order, lines)
            .inspect_err(|err| warn!(error = %err, "fulfillment draft rejected"))?;

        let now = Utc::now().into();
        let txn = self.db.begin().await.map_err(database)?;
        fulfillments::ActiveModel {
            id: Set(fulfillment.id.into_inner()),
            sales_order_id: Set(sales_order_id.into_inner()),
            status: Set(fulfillment.status.into()),
            total_cost: Set(Decimal::ZERO),
            approved_at: Set(None),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(database)?;

        for line in &fulfillment.lines {
            fulfillment_items::ActiveModel {
                id: Set(line.id.into_inner()),
                fulfillment_id: Set(fulfillment.id.into_inner()),
                sales_order_item_id: Set(line.sales_order_item_id.into_inner()),
                variant_id: Set(line.variant_id.into_inner()),
                quantity: Set(line.quantity),
                cost: Set(None),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(database)?;
        }
        txn.commit().await.map_err(database)?;

        info!(fulfillment_id = %fulfillment.id, "fulfillment drafted");
        Ok(fulfillment)
    }

    /// Loads a fulfillment with its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the fulfillment is missing or soft-deleted.
    pub async fn find_fulfillment(
        &self,
        id: FulfillmentId,
    ) -> Result<Fulfillment, FulfillmentError> {
        load_fulfillment(&self.db, id, false).await
    }

    /// Approves a fulfillment: ships every line from the oldest lots, prices
    /// it and rolls the sales order forward.
    ///
    /// The fulfillment, its sales order, lots and variants are locked for the
    /// duration of the transaction. Any failure leaves the database untouched.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `SalesOrderNotFound` for missing documents
    /// - `AlreadyFinished` / `WrongStatus` / `NoLines` from the status guard
    /// - `InsufficientStock` if a line does not fit into available minus committed stock
    #[instrument(skip(self))]
    pub async fn approve_fulfillment(
        &self,
        id: FulfillmentId,
    ) -> Result<ApprovalOutcome, FulfillmentError> {
        let txn = self.db.begin().await.map_err(database)?;

        let fulfillment = load_fulfillment(&txn, id, true).await?;
        // Approvals of sibling fulfillments meet here before any variant lock.
        let order = load_sales_order(&txn, fulfillment.sales_order_id, true).await?;
        let variant_ids: Vec<VariantId> = fulfillment.lines.iter().map(|l| l.variant_id).collect();
        let mut book = ledger::load_book(&txn, &variant_ids)
            .await
            .map_err(database)?;

        let now = Utc::now();
        let outcome = FulfillmentApproval::approve(&fulfillment, &order, &mut book, now)
            .inspect_err(|err| warn!(error = %err, "fulfillment approval rejected"))?;

        ledger::apply_changes(&txn, &book.take_changes())
            .await
            .map_err(database)?;
        persist_approval(&txn, &outcome, now).await.map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(
            fulfillment_id = %id,
            total_cost = %outcome.total_cost,
            sales_order_status = %outcome.sales_order.status,
            "fulfillment approved"
        );
        Ok(outcome)
    }
}

async fn load_sales_order<C>(
    conn: &C,
    id: SalesOrderId,
    lock: bool,
) -> Result<SalesOrderProgress, FulfillmentError>
where
    C: ConnectionTrait,
{
    let query = sales_orders::Entity::find_by_id(id.into_inner());
    let query = if lock { ledger::for_update(conn, query) } else { query };
    let order = query
        .one(conn)
        .await
        .map_err(database)?
        .filter(|order| !order.is_deleted)
        .ok_or(FulfillmentError::SalesOrderNotFound(id))?;

    let items = sales_order_items::Entity::find()
        .filter(sales_order_items::Column::SalesOrderId.eq(order.id))
        .order_by_asc(sales_order_items::Column::CreatedAt)
        .order_by_asc(sales_order_items::Column::Id)
        .all(conn)
        .await
        .map_err(database)?;

    Ok(SalesOrderProgress {
        id,
        status: order.status.into(),
        total_cost: order.total_cost,
        items: items.into_iter().map(SalesOrderLine::from).collect(),
    })
}

async fn load_fulfillment<C>(
    conn: &C,
    id: FulfillmentId,
    lock: bool,
) -> Result<Fulfillment, FulfillmentError>
where
    C: ConnectionTrait,
{
    let query = fulfillments::Entity::find_by_id(id.into_inner());
    let query = if lock { ledger::for_update(conn, query) } else { query };
    let fulfillment = query
        .one(conn)
        .await
        .map_err(database)?
        .filter(|f| !f.is_deleted)
        .ok_or(FulfillmentError::NotFound(id))?;

    let lines = fulfillment_items::Entity::find()
        .filter(fulfillment_items::Column::FulfillmentId.eq(fulfillment.id))
        .order_by_asc(fulfillment_items::Column::CreatedAt)
        .order_by_asc(fulfillment_items::Column::Id)
        .all(conn)
        .await
        .map_err(database)?;

    Ok(Fulfillment {
        id,
        sales_order_id: SalesOrderId::from_uuid(fulfillment.sales_order_id),
        status: fulfillment.status.into(),
        lines: lines.into_iter().map(FulfillmentLine::from).collect(),
    })
}

async fn persist_approval<C>(
    conn: &C,
    outcome: &ApprovalOutcome,
    at: DateTime<Utc>,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let at: sea_orm::prelude::DateTimeWithTimeZone = at.into();

    fulfillments::Entity::update_many()
        .col_expr(fulfillments::Column::Status, Expr::value(DocumentStatus::from(outcome.status)))
        .col_expr(fulfillments::Column::TotalCost, Expr::value(outcome.total_cost))
        .col_expr(fulfillments::Column::ApprovedAt, Expr::value(Some(at)))
        .col_expr(fulfillments::Column::UpdatedAt, Expr::value(at))
        .filter(fulfillments::Column::Id.eq(outcome.fulfillment_id.into_inner()))
        .exec(conn)
        .await?;

    for line in &outcome.line_costs {
        fulfillment_items::Entity::update_many()
            .col_expr(fulfillment_items::Column::Cost, Expr::value(Some(line.cost)))
            .filter(fulfillment_items::Column::Id.eq(line.line_id.into_inner()))
            .exec(conn)
            .await?;
    }

    let shipped: BTreeSet<SalesOrderItemId> = outcome
        .line_costs
        .iter()
        .map(|line| line.sales_order_item_id)
        .collect();
    for item in outcome
        .sales_order
        .items
        .iter()
        .filter(|item| shipped.contains(&item.id))
    {
        sales_order_items::Entity::update_many()
            .col_expr(
                sales_order_items::Column::FulfilledQuantity,
                Expr::value(item.fulfilled_quantity),
            )
            .filter(sales_order_items::Column::Id.eq(item.id.into_inner()))
            .exec(conn)
            .await?;
    }

    sales_orders::Entity::update_many()
        .col_expr(
            sales_orders::Column::Status,
            Expr::value(DocumentStatus::from(outcome.sales_order.status)),
        )
        .col_expr(sales_orders::Column::TotalCost, Expr::value(outcome.sales_order.total_cost))
        .col_expr(sales_orders::Column::UpdatedAt, Expr::value(at))
        .filter(sales_orders::Column::Id.eq(outcome.sales_order.id.into_inner()))
        .exec(conn)
        .await?;

    Ok(())
}
