//! Purchasing domain types.
//!
//! Snapshots are plain copies of persisted rows. Workflows read them and
//! return what should change; they never talk to the store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockflow_shared::types::{
    FinanceExpenseId, PartnerId, PurchaseInvoiceId, PurchaseOrderId, PurchaseOrderItemId,
    ReceivingId, ReceivingItemId, VariantId,
};

use crate::status::{DocumentStatus, ExpenseStatus};

/// A purchase-order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    /// Purchase-order item id.
    pub id: PurchaseOrderItemId,
    /// Variant ordered.
    pub variant_id: VariantId,
    /// Quantity ordered.
    pub quantity: i64,
    /// Price per unit; received lots are costed at it.
    pub unit_price: Decimal,
}

/// A purchase order with its progress statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderSnapshot {
    /// Purchase order id.
    pub id: PurchaseOrderId,
    /// Supplier.
    pub supplier_id: PartnerId,
    /// Overall document status.
    pub status: DocumentStatus,
    /// Payment progress.
    pub invoice_status: DocumentStatus,
    /// Goods-receipt progress.
    pub receiving_status: DocumentStatus,
    /// Σ line quantity × unit price.
    pub total_charge: Decimal,
    /// Σ paid across live invoices.
    pub total_paid: Decimal,
    /// Order lines.
    pub lines: Vec<PurchaseOrderLine>,
}

impl PurchaseOrderSnapshot {
    /// Looks up an order line.
    #[must_use]
    pub fn line(&self, id: PurchaseOrderItemId) -> Option<&PurchaseOrderLine> {
        self.lines.iter().find(|line| line.id == id)
    }
}

/// A finance expense paying part of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSnapshot {
    /// Expense id.
    pub id: FinanceExpenseId,
    /// Amount paid.
    pub amount: Decimal,
    /// Clearing status.
    pub status: ExpenseStatus,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

/// A purchase invoice and its expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSnapshot {
    /// Invoice id.
    pub id: PurchaseInvoiceId,
    /// Amount invoiced.
    pub total_amount: Decimal,
    /// Σ cleared expenses.
    pub total_paid: Decimal,
    /// Invoice status.
    pub status: DocumentStatus,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Expenses recorded against the invoice.
    pub expenses: Vec<ExpenseSnapshot>,
}

/// A received line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivingLine {
    /// Receiving item id.
    pub id: ReceivingItemId,
    /// Purchase-order line received against.
    pub purchase_order_item_id: PurchaseOrderItemId,
    /// Variant received.
    pub variant_id: VariantId,
    /// Quantity received.
    pub quantity: i64,
    /// Cost per unit of the created lot.
    pub unit_cost: Decimal,
}

/// A receiving and its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivingSnapshot {
    /// Receiving id.
    pub id: ReceivingId,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Received lines.
    pub lines: Vec<ReceivingLine>,
}

/// A requested line of a new receiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivingDraftLine {
    /// Purchase-order line to receive against.
    pub purchase_order_item_id: PurchaseOrderItemId,
    /// Quantity received.
    pub quantity: i64,
}
