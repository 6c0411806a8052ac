//! Purchase repository: suppliers, purchase orders, receivings, invoices,
//! expenses, status rollups and cancellation.
//!
//! Supplier running totals move with the order: creating an order adds its
//! charge to the supplier's expenditure, the first invoice adds it to the
//! supplier's credit, cleared expenses pay the credit down and cancellation
//! reverses whatever is still outstanding.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use stockflow_core::purchasing::{
    CancellationPlan, ExpenseSnapshot, InvoiceSnapshot, PurchaseCancellation, PurchaseError,
    PurchaseInvoicing, PurchaseOrderLine, PurchaseOrderSnapshot, PurchaseReceiving, PurchaseRollup,
    PurchaseStatusRollup, ReceivingDraftLine, ReceivingLine, ReceivingOutcome, ReceivingSnapshot,
};
use stockflow_core::stock::StockReference;
use stockflow_core::DocumentStatus as Status;
use stockflow_shared::ValidationErrors;
use stockflow_shared::types::{
    FinanceExpenseId, PartnerId, PurchaseInvoiceId, PurchaseOrderId, PurchaseOrderItemId,
    ReceivingId, VariantId,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::ledger;
use crate::entities::{
    finance_expenses, item_variants, partners, purchase_invoices, purchase_order_items,
    purchase_orders, receiving_items, receivings,
    sea_orm_active_enums::{DocumentStatus, ExpenseStatus},
};

fn database(err: DbErr) -> PurchaseError {
    PurchaseError::Database(err.to_string())
}

/// One line of a new purchase order.
#[derive(Debug, Clone)]
pub struct CreatePurchaseOrderItemInput {
    /// Variant being bought.
    pub variant_id: VariantId,
    /// Ordered quantity, must be positive.
    pub quantity: i64,
    /// Price per unit, must not be negative.
    pub unit_price: Decimal,
}

/// Input for creating a purchase order.
#[derive(Debug, Clone)]
pub struct CreatePurchaseOrderInput {
    /// Supplier the goods are bought from.
    pub supplier_id: PartnerId,
    /// Ordered lines.
    pub items: Vec<CreatePurchaseOrderItemInput>,
}

/// Repository for purchasing documents.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    db: DatabaseConnection,
}

impl PurchaseRepository {
    /// Creates a new purchase repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a supplier with zero running totals.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank name.
    pub async fn create_partner(&self, name: &str) -> Result<partners::Model, PurchaseError> {
        let name = name.trim();
        if name.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.add("name", "REQUIRED", "a partner name is required");
            return Err(errors.into());
        }

        let now = Utc::now().into();
        let partner = partners::ActiveModel {
            id: Set(PartnerId::new().into_inner()),
            name: Set(name.to_string()),
            total_expenditure: Set(Decimal::ZERO),
            total_credit: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(database)?;

        info!(partner_id = %partner.id, "partner created");
        Ok(partner)
    }

    /// Loads a supplier.
    ///
    /// # Errors
    ///
    /// Returns `PartnerNotFound` if the supplier does not exist.
    pub async fn find_partner(&self, id: PartnerId) -> Result<partners::Model, PurchaseError> {
        partners::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(database)?
            .ok_or(PurchaseError::PartnerNotFound(id))
    }

    /// Creates a purchase order with every status `new` and adds its charge
    /// to the supplier's expenditure.
    ///
    /// # Errors
    ///
    /// - `PartnerNotFound` if the supplier does not exist
    /// - `Validation` carrying every failed item check
    #[instrument(skip(self, input), fields(supplier_id = %input.supplier_id))]
    pub async fn create_purchase_order(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> Result<PurchaseOrderSnapshot, PurchaseError> {
        let variant_ids: Vec<Uuid> = input
            .items
            .iter()
            .map(|item| item.variant_id.into_inner())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let known: BTreeSet<Uuid> = if variant_ids.is_empty() {
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
        if input.items.is_empty() {
            errors.add("items", "REQUIRED", "at least one item is required");
        }
        let mut total_charge = Some(Decimal::ZERO);
        for (index, item) in input.items.iter().enumerate() {
            let line_charge = item.unit_price.checked_mul(Decimal::from(item.quantity));
            total_charge = total_charge
                .zip(line_charge)
                .and_then(|(total, line)| total.checked_add(line));
            if item.quantity <= 0 {
                errors.add(
                    format!("items[{index}].quantity"),
                    "NOT_POSITIVE",
                    "quantity must be positive",
                );
            }
            if item.unit_price < Decimal::ZERO {
                errors.add(
                    format!("items[{index}].unit_price"),
                    "NEGATIVE",
                    "unit price must not be negative",
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
        if total_charge.is_none() {
            errors.add("items", "TOO_LARGE", "order total exceeds the supported range");
        }
        errors.into_result()?;
        let total_charge = total_charge.unwrap_or_default();

        let txn = self.db.begin().await.map_err(database)?;
        ledger::for_update(&txn, partners::Entity::find_by_id(input.supplier_id.into_inner()))
            .one(&txn)
            .await
            .map_err(database)?
            .ok_or(PurchaseError::PartnerNotFound(input.supplier_id))?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        let order_id = PurchaseOrderId::new();

        purchase_orders::ActiveModel {
            id: Set(order_id.into_inner()),
            supplier_id: Set(input.supplier_id.into_inner()),
            status: Set(DocumentStatus::New),
            invoice_status: Set(DocumentStatus::New),
            receiving_status: Set(DocumentStatus::New),
            total_charge: Set(total_charge),
            total_paid: Set(Decimal::ZERO),
            cancellation_note: Set(None),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(database)?;

        let mut lines = Vec::with_capacity(input.items.len());
        for item in input.items {
            let id = PurchaseOrderItemId::new();
            purchase_order_items::ActiveModel {
                id: Set(id.into_inner()),
                purchase_order_id: Set(order_id.into_inner()),
                variant_id: Set(item.variant_id.into_inner()),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(database)?;
            lines.push(PurchaseOrderLine {
                id,
                variant_id: item.variant_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }

        adjust_partner(&txn, input.supplier_id, total_charge, Decimal::ZERO, now)
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(
            purchase_order_id = %order_id,
            total_charge = %total_charge,
            "purchase order created"
        );
        Ok(PurchaseOrderSnapshot {
            id: order_id,
            supplier_id: input.supplier_id,
            status: Status::New,
            invoice_status: Status::New,
            receiving_status: Status::New,
            total_charge,
            total_paid: Decimal::ZERO,
            lines,
        })
    }

    /// Loads a purchase order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order is missing or soft-deleted.
    pub async fn find_purchase_order(
        &self,
        id: PurchaseOrderId,
    ) -> Result<PurchaseOrderSnapshot, PurchaseError> {
        load_order(&self.db, id, false).await
    }

    /// Live and soft-deleted invoices of an order, with their expenses.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn invoices_for(
        &self,
        id: PurchaseOrderId,
    ) -> Result<Vec<InvoiceSnapshot>, PurchaseError> {
        load_invoices(&self.db, id).await
    }

    /// Live and soft-deleted receivings of an order, with their lines.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn receivings_for(
        &self,
        id: PurchaseOrderId,
    ) -> Result<Vec<ReceivingSnapshot>, PurchaseError> {
        load_receivings(&self.db, id).await
    }

    /// Receives goods against a purchase order, one new lot per line.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `AlreadyCancelled` for a missing or cancelled order
    /// - `Validation` carrying every failed line check
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn record_receiving(
        &self,
        order_id: PurchaseOrderId,
        lines: &[ReceivingDraftLine],
    ) -> Result<ReceivingOutcome, PurchaseError> {
        let txn = self.db.begin().await.map_err(database)?;
        let order = load_order(&txn, order_id, true).await?;
        let existing = load_receivings(&txn, order_id).await?;
        let variant_ids: Vec<VariantId> = order.lines.iter().map(|l| l.variant_id).collect();
        let mut book = ledger::load_book(&txn, &variant_ids)
            .await
            .map_err(database)?;

        let now = Utc::now();
        let outcome = PurchaseReceiving::receive(&order, &existing, lines, &mut book, now)
            .inspect_err(|err| warn!(error = %err, "receiving rejected"))?;

        let at: DateTimeWithTimeZone = now.into();
        receivings::ActiveModel {
            id: Set(outcome.receiving.id.into_inner()),
            purchase_order_id: Set(order_id.into_inner()),
            is_deleted: Set(false),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .map_err(database)?;
        ledger::apply_changes(&txn, &book.take_changes())
            .await
            .map_err(database)?;
        for (line, stock) in outcome.receiving.lines.iter().zip(&outcome.stock) {
            receiving_items::ActiveModel {
                id: Set(line.id.into_inner()),
                receiving_id: Set(outcome.receiving.id.into_inner()),
                purchase_order_item_id: Set(line.purchase_order_item_id.into_inner()),
                variant_id: Set(line.variant_id.into_inner()),
                quantity: Set(line.quantity),
                unit_cost: Set(line.unit_cost),
                lot_id: Set(Some(stock.lot.id.into_inner())),
                created_at: Set(at),
            }
            .insert(&txn)
            .await
            .map_err(database)?;
        }

        purchase_orders::Entity::update_many()
            .col_expr(
                purchase_orders::Column::ReceivingStatus,
                Expr::value(DocumentStatus::from(outcome.receiving_status)),
            )
            .col_expr(
                purchase_orders::Column::Status,
                Expr::value(DocumentStatus::from(outcome.status)),
            )
            .col_expr(purchase_orders::Column::UpdatedAt, Expr::value(at))
            .filter(purchase_orders::Column::Id.eq(order_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(
            receiving_id = %outcome.receiving.id,
            receiving_status = %outcome.receiving_status,
            "goods received"
        );
        Ok(outcome)
    }

    /// Registers an invoice against a purchase order.
    ///
    /// The order's invoicing and document statuses move to `active`. The first
    /// invoice of an order books the order's charge as supplier credit.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `AlreadyCancelled` for a missing or cancelled order
    /// - `Validation` if the amount is not positive or exceeds the uninvoiced charge
    #[instrument(skip(self))]
    pub async fn register_invoice(
        &self,
        order_id: PurchaseOrderId,
        amount: Decimal,
    ) -> Result<InvoiceSnapshot, PurchaseError> {
        let txn = self.db.begin().await.map_err(database)?;
        let order = load_order(&txn, order_id, true).await?;
        let invoices = load_invoices(&txn, order_id).await?;

        let invoice = PurchaseInvoicing::register_invoice(&order, &invoices, amount)
            .inspect_err(|err| warn!(error = %err, "invoice rejected"))?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        purchase_invoices::ActiveModel {
            id: Set(invoice.id.into_inner()),
            purchase_order_id: Set(order_id.into_inner()),
            total_amount: Set(invoice.total_amount),
            total_paid: Set(invoice.total_paid),
            status: Set(invoice.status.into()),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(database)?;

        if !order.invoice_status.has_progressed() {
            adjust_partner(&txn, order.supplier_id, Decimal::ZERO, order.total_charge, now)
                .await
                .map_err(database)?;
        }
        purchase_orders::Entity::update_many()
            .col_expr(
                purchase_orders::Column::InvoiceStatus,
                Expr::value(DocumentStatus::from(order.invoice_status.activate())),
            )
            .col_expr(
                purchase_orders::Column::Status,
                Expr::value(DocumentStatus::from(order.status.activate())),
            )
            .col_expr(purchase_orders::Column::UpdatedAt, Expr::value(now))
            .filter(purchase_orders::Column::Id.eq(order_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(invoice_id = %invoice.id, amount = %invoice.total_amount, "invoice registered");
        Ok(invoice)
    }

    /// Records an uncleared expense against an invoice.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` for a missing or soft-deleted invoice
    /// - `Validation` if the amount is not positive or exceeds the invoice
    #[instrument(skip(self))]
    pub async fn record_expense(
        &self,
        invoice_id: PurchaseInvoiceId,
        amount: Decimal,
    ) -> Result<ExpenseSnapshot, PurchaseError> {
        let txn = self.db.begin().await.map_err(database)?;
        let order_id = invoice_order(&txn, invoice_id).await?;
        // lock the order so concurrent expenses on one invoice serialise
        load_order(&txn, order_id, true).await?;
        let mut invoices = load_invoices(&txn, order_id).await?;
        let invoice = invoices
            .iter_mut()
            .find(|invoice| invoice.id == invoice_id)
            .ok_or(PurchaseError::InvoiceNotFound(invoice_id))?;

        let expense = PurchaseInvoicing::record_expense(invoice, amount)
            .inspect_err(|err| warn!(error = %err, "expense rejected"))?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        finance_expenses::ActiveModel {
            id: Set(expense.id.into_inner()),
            purchase_invoice_id: Set(invoice_id.into_inner()),
            amount: Set(expense.amount),
            status: Set(expense.status.into()),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(database)?;
        write_invoice_status(&txn, invoice_id, invoice.status, now)
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(expense_id = %expense.id, amount = %expense.amount, "expense recorded");
        Ok(expense)
    }

    /// Clears an expense, pays down the supplier's credit and reruns the
    /// order's status rollup.
    ///
    /// # Errors
    ///
    /// - `ExpenseNotFound` / `InvoiceNotFound` for missing documents
    /// - `ExpenseAlreadyCleared` if it was cleared before
    #[instrument(skip(self))]
    pub async fn clear_expense(
        &self,
        expense_id: FinanceExpenseId,
    ) -> Result<PurchaseRollup, PurchaseError> {
        let txn = self.db.begin().await.map_err(database)?;
        let expense = finance_expenses::Entity::find_by_id(expense_id.into_inner())
            .one(&txn)
            .await
            .map_err(database)?
            .filter(|expense| !expense.is_deleted)
            .ok_or(PurchaseError::ExpenseNotFound(expense_id))?;
        let invoice_id = PurchaseInvoiceId::from_uuid(expense.purchase_invoice_id);
        let order_id = invoice_order(&txn, invoice_id).await?;

        let mut order = load_order(&txn, order_id, true).await?;
        let mut invoices = load_invoices(&txn, order_id).await?;
        let receivings = load_receivings(&txn, order_id).await?;
        let invoice = invoices
            .iter_mut()
            .find(|invoice| invoice.id == invoice_id)
            .ok_or(PurchaseError::InvoiceNotFound(invoice_id))?;
        PurchaseInvoicing::clear_expense(invoice, expense_id)
            .inspect_err(|err| warn!(error = %err, "expense clearing rejected"))?;

        let rollup = PurchaseStatusRollup::rollup(&order, &invoices, &receivings)?;
        PurchaseStatusRollup::apply(&rollup, &mut order, &mut invoices);

        let now: DateTimeWithTimeZone = Utc::now().into();
        finance_expenses::Entity::update_many()
            .col_expr(finance_expenses::Column::Status, Expr::value(ExpenseStatus::Cleared))
            .col_expr(finance_expenses::Column::UpdatedAt, Expr::value(now))
            .filter(finance_expenses::Column::Id.eq(expense_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(database)?;
        adjust_partner(&txn, order.supplier_id, Decimal::ZERO, -expense.amount, now)
            .await
            .map_err(database)?;
        write_rollup(&txn, order_id, &rollup, now)
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(
            expense_id = %expense_id,
            invoice_status = %rollup.invoice_status,
            status = %rollup.status,
            "expense cleared"
        );
        Ok(rollup)
    }

    /// Recomputes and stores the invoicing, receiving and document statuses of
    /// an order. Running it twice yields the same result.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` / `AlreadyCancelled` for a missing or cancelled order.
    #[instrument(skip(self))]
    pub async fn refresh_statuses(
        &self,
        order_id: PurchaseOrderId,
    ) -> Result<PurchaseRollup, PurchaseError> {
        let txn = self.db.begin().await.map_err(database)?;
        let order = load_order(&txn, order_id, true).await?;
        let invoices = load_invoices(&txn, order_id).await?;
        let receivings = load_receivings(&txn, order_id).await?;

        let rollup = PurchaseStatusRollup::rollup(&order, &invoices, &receivings)?;

        write_rollup(&txn, order_id, &rollup, Utc::now().into())
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(
            purchase_order_id = %order_id,
            status = %rollup.status,
            "purchase order statuses refreshed"
        );
        Ok(rollup)
    }

    /// Cancels a purchase order.
    ///
    /// Received stock is reversed, linked receivings, invoices and expenses are
    /// soft-deleted and the supplier's totals are reduced. If any received lot
    /// was already drawn from, nothing changes.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `AlreadyCancelled` for a missing or cancelled order
    /// - `Validation` for a blank note
    /// - `ItemAlreadySold` if received stock was sold
    #[instrument(skip(self, note))]
    pub async fn cancel_purchase_order(
        &self,
        order_id: PurchaseOrderId,
        note: &str,
    ) -> Result<CancellationPlan, PurchaseError> {
        let txn = self.db.begin().await.map_err(database)?;
        let order = load_order(&txn, order_id, true).await?;
        let receivings = load_receivings(&txn, order_id).await?;
        let invoices = load_invoices(&txn, order_id).await?;

        let mut references = vec![StockReference::PurchaseOrder(order_id)];
        references.extend(
            receivings
                .iter()
                .filter(|r| !r.is_deleted)
                .map(|r| StockReference::Receiving(r.id)),
        );
        let mut book = ledger::load_book_for_references(&txn, &references)
            .await
            .map_err(database)?;

        let now = Utc::now();
        let plan =
            PurchaseCancellation::cancel(&order, &receivings, &invoices, note, &mut book, now)
                .inspect_err(|err| warn!(error = %err, "cancellation rejected"))?;

        let at: DateTimeWithTimeZone = now.into();
        ledger::apply_changes(&txn, &book.take_changes())
            .await
            .map_err(database)?;
        persist_cancellation(&txn, &plan, at)
            .await
            .map_err(database)?;
        txn.commit().await.map_err(database)?;

        info!(
            purchase_order_id = %order_id,
            reversed = plan.movements.len(),
            receivings = plan.deleted_receivings.len(),
            invoices = plan.deleted_invoices.len(),
            "purchase order cancelled"
        );
        Ok(plan)
    }
}

async fn load_order<C>(
    conn: &C,
    id: PurchaseOrderId,
    lock: bool,
) -> Result<PurchaseOrderSnapshot, PurchaseError>
where
    C: ConnectionTrait,
{
    let query = purchase_orders::Entity::find_by_id(id.into_inner());
    let query = if lock { ledger::for_update(conn, query) } else { query };
    let order = query
        .one(conn)
        .await
        .map_err(database)?
        .filter(|order| !order.is_deleted)
        .ok_or(PurchaseError::NotFound(id))?;

    let lines = purchase_order_items::Entity::find()
        .filter(purchase_order_items::Column::PurchaseOrderId.eq(order.id))
        .order_by_asc(purchase_order_items::Column::CreatedAt)
        .order_by_asc(purchase_order_items::Column::Id)
        .all(conn)
        .await
        .map_err(database)?;

    Ok(PurchaseOrderSnapshot {
        id,
        supplier_id: PartnerId::from_uuid(order.supplier_id),
        status: order.status.into(),
        invoice_status: order.invoice_status.into(),
        receiving_status: order.receiving_status.into(),
        total_charge: order.total_charge,
        total_paid: order.total_paid,
        lines: lines.into_iter().map(PurchaseOrderLine::from).collect(),
    })
}

async fn load_invoices<C>(
    conn: &C,
    order_id: PurchaseOrderId,
) -> Result<Vec<InvoiceSnapshot>, PurchaseError>
where
    C: ConnectionTrait,
{
    let rows = purchase_invoices::Entity::find()
        .filter(purchase_invoices::Column::PurchaseOrderId.eq(order_id.into_inner()))
        .order_by_asc(purchase_invoices::Column::CreatedAt)
        .order_by_asc(purchase_invoices::Column::Id)
        .all(conn)
        .await
        .map_err(database)?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut expenses: HashMap<Uuid, Vec<ExpenseSnapshot>> = HashMap::new();
    for expense in finance_expenses::Entity::find()
        .filter(finance_expenses::Column::PurchaseInvoiceId.is_in(rows.iter().map(|i| i.id)))
        .order_by_asc(finance_expenses::Column::CreatedAt)
        .order_by_asc(finance_expenses::Column::Id)
        .all(conn)
        .await
        .map_err(database)?
    {
        expenses
            .entry(expense.purchase_invoice_id)
            .or_default()
            .push(ExpenseSnapshot::from(expense));
    }

    Ok(rows
        .into_iter()
        .map(|invoice| InvoiceSnapshot {
            id: PurchaseInvoiceId::from_uuid(invoice.id),
            total_amount: invoice.total_amount,
            total_paid: invoice.total_paid,
            status: invoice.status.into(),
            is_deleted: invoice.is_deleted,
            expenses: expenses.remove(&invoice.id).unwrap_or_default(),
        })
        .collect())
}

async fn load_receivings<C>(
    conn: &C,
    order_id: PurchaseOrderId,
) -> Result<Vec<ReceivingSnapshot>, PurchaseError>
where
    C: ConnectionTrait,
{
    let rows = receivings::Entity::find()
        .filter(receivings::Column::PurchaseOrderId.eq(order_id.into_inner()))
        .order_by_asc(receivings::Column::CreatedAt)
        .order_by_asc(receivings::Column::Id)
        .all(conn)
        .await
        .map_err(database)?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut lines: HashMap<Uuid, Vec<ReceivingLine>> = HashMap::new();
    for item in receiving_items::Entity::find()
        .filter(receiving_items::Column::ReceivingId.is_in(rows.iter().map(|r| r.id)))
        .order_by_asc(receiving_items::Column::CreatedAt)
        .order_by_asc(receiving_items::Column::Id)
        .all(conn)
        .await
        .map_err(database)?
    {
        lines
            .entry(item.receiving_id)
            .or_default()
            .push(ReceivingLine::from(item));
    }

    Ok(rows
        .into_iter()
        .map(|receiving| ReceivingSnapshot {
            id: ReceivingId::from_uuid(receiving.id),
            is_deleted: receiving.is_deleted,
            lines: lines.remove(&receiving.id).unwrap_or_default(),
        })
        .collect())
}

/// The order a live invoice belongs to.
async fn invoice_order<C>(
    conn: &C,
    invoice_id: PurchaseInvoiceId,
) -> Result<PurchaseOrderId, PurchaseError>
where
    C: ConnectionTrait,
{
    purchase_invoices::Entity::find_by_id(invoice_id.into_inner())
        .one(conn)
        .await
        .map_err(database)?
        .filter(|invoice| !invoice.is_deleted)
        .map(|invoice| PurchaseOrderId::from_uuid(invoice.purchase_order_id))
        .ok_or(PurchaseError::InvoiceNotFound(invoice_id))
}

/// Adds signed deltas to a supplier's running totals.
async fn adjust_partner<C>(
    conn: &C,
    partner_id: PartnerId,
    expenditure: Decimal,
    credit: Decimal,
    at: DateTimeWithTimeZone,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    partners::Entity::update_many()
        .col_expr(
            partners::Column::TotalExpenditure,
            Expr::col(partners::Column::TotalExpenditure).add(expenditure),
        )
        .col_expr(
            partners::Column::TotalCredit,
            Expr::col(partners::Column::TotalCredit).add(credit),
        )
        .col_expr(partners::Column::UpdatedAt, Expr::value(at))
        .filter(partners::Column::Id.eq(partner_id.into_inner()))
        .exec(conn)
        .await?;
    Ok(())
}

async fn write_invoice_status<C>(
    conn: &C,
    invoice_id: PurchaseInvoiceId,
    status: Status,
    at: DateTimeWithTimeZone,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    purchase_invoices::Entity::update_many()
        .col_expr(purchase_invoices::Column::Status, Expr::value(DocumentStatus::from(status)))
        .col_expr(purchase_invoices::Column::UpdatedAt, Expr::value(at))
        .filter(purchase_invoices::Column::Id.eq(invoice_id.into_inner()))
        .exec(conn)
        .await?;
    Ok(())
}

async fn write_rollup<C>(
    conn: &C,
    order_id: PurchaseOrderId,
    rollup: &PurchaseRollup,
    at: DateTimeWithTimeZone,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    for totals in &rollup.invoices {
        purchase_invoices::Entity::update_many()
            .col_expr(purchase_invoices::Column::TotalPaid, Expr::value(totals.total_paid))
            .col_expr(
                purchase_invoices::Column::Status,
                Expr::value(DocumentStatus::from(totals.status)),
            )
            .col_expr(purchase_invoices::Column::UpdatedAt, Expr::value(at))
            .filter(purchase_invoices::Column::Id.eq(totals.invoice_id.into_inner()))
            .exec(conn)
            .await?;
    }

    purchase_orders::Entity::update_many()
        .col_expr(purchase_orders::Column::TotalPaid, Expr::value(rollup.total_paid))
        .col_expr(
            purchase_orders::Column::InvoiceStatus,
            Expr::value(DocumentStatus::from(rollup.invoice_status)),
        )
        .col_expr(
            purchase_orders::Column::ReceivingStatus,
            Expr::value(DocumentStatus::from(rollup.receiving_status)),
        )
        .col_expr(purchase_orders::Column::Status, Expr::value(DocumentStatus::from(rollup.status)))
        .col_expr(purchase_orders::Column::UpdatedAt, Expr::value(at))
        .filter(purchase_orders::Column::Id.eq(order_id.into_inner()))
        .exec(conn)
        .await?;
    Ok(())
}

async fn persist_cancellation<C>(
    conn: &C,
    plan: &CancellationPlan,
    at: DateTimeWithTimeZone,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    purchase_orders::Entity::update_many()
        .col_expr(purchase_orders::Column::Status, Expr::value(DocumentStatus::Cancelled))
        .col_expr(purchase_orders::Column::CancellationNote, Expr::value(Some(plan.note.clone())))
        .col_expr(purchase_orders::Column::UpdatedAt, Expr::value(at))
        .filter(purchase_orders::Column::Id.eq(plan.order_id.into_inner()))
        .exec(conn)
        .await?;

    adjust_partner(
        conn,
        plan.supplier_id,
        -plan.expenditure_reduction,
        -plan.credit_reduction,
        at,
    )
    .await?;

    if !plan.deleted_receivings.is_empty() {
        receivings::Entity::update_many()
            .col_expr(receivings::Column::IsDeleted, Expr::value(true))
            .col_expr(receivings::Column::UpdatedAt, Expr::value(at))
            .filter(
                receivings::Column::Id
                    .is_in(plan.deleted_receivings.iter().map(|id| id.into_inner())),
            )
            .exec(conn)
            .await?;
    }
    if !plan.deleted_invoices.is_empty() {
        purchase_invoices::Entity::update_many()
            .col_expr(purchase_invoices::Column::IsDeleted, Expr::value(true))
            .col_expr(purchase_invoices::Column::UpdatedAt, Expr::value(at))
            .filter(
                purchase_invoices::Column::Id
                    .is_in(plan.deleted_invoices.iter().map(|id| id.into_inner())),
            )
            .exec(conn)
            .await?;
    }
    if !plan.deleted_expenses.is_empty() {
        finance_expenses::Entity::update_many()
            .col_expr(finance_expenses::Column::IsDeleted, Expr::value(true))
            .col_expr(finance_expenses::Column::UpdatedAt, Expr::value(at))
            .filter(
                finance_expenses::Column::Id
                    .is_in(plan.deleted_expenses.iter().map(|id| id.into_inner())),
            )
            .exec(conn)
            .await?;
    }
    Ok(())
}
