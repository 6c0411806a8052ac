//! Purchase-order status rollup.
//!
//! Recomputes paid totals and the three purchase-order statuses from the
//! order's live invoices, expenses and receivings. Running the rollup on its
//! own output changes nothing.

use rust_decimal::Decimal;
use serde::Serialize;

use stockflow_shared::types::PurchaseInvoiceId;

use crate::purchasing::error::PurchaseError;
use crate::purchasing::types::{InvoiceSnapshot, PurchaseOrderSnapshot, ReceivingSnapshot};
use crate::status::{DocumentStatus, ExpenseStatus};

/// Recomputed figures of one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
    /// Invoice id.
    pub invoice_id: PurchaseInvoiceId,
    /// Σ cleared live expenses.
    pub total_paid: Decimal,
    /// Settled invoice status.
    pub status: DocumentStatus,
}

/// Recomputed figures of a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseRollup {
    /// Per live invoice.
    pub invoices: Vec<InvoiceTotals>,
    /// Σ paid across live invoices.
    pub total_paid: Decimal,
    /// Settled invoice status of the order.
    pub invoice_status: DocumentStatus,
    /// Σ quantity over live receivings.
    pub total_received: i64,
    /// Σ quantity over order lines.
    pub total_ordered: i64,
    /// Settled receiving status of the order.
    pub receiving_status: DocumentStatus,
    /// Settled document status of the order.
    pub status: DocumentStatus,
}

/// Stateless purchase-order rollup.
pub struct PurchaseStatusRollup;

impl PurchaseStatusRollup {
    /// Invoice part: per-invoice paid totals and the order's invoice status.
    ///
    /// The order is fully invoiced-and-paid once at least one live invoice
    /// exists and Σ paid equals the total charge.
    #[must_use]
    pub fn invoices(
        order: &PurchaseOrderSnapshot,
        invoices: &[InvoiceSnapshot],
    ) -> (Vec<InvoiceTotals>, Decimal, DocumentStatus) {
        let totals: Vec<InvoiceTotals> = invoices
            .iter()
            .filter(|invoice| !invoice.is_deleted)
            .map(|invoice| {
                let total_paid: Decimal = invoice
                    .expenses
                    .iter()
                    .filter(|e| !e.is_deleted && e.status == ExpenseStatus::Cleared)
                    .map(|e| e.amount)
                    .sum();
                InvoiceTotals {
                    invoice_id: invoice.id,
                    total_paid,
                    status: invoice.status.settle(total_paid == invoice.total_amount),
                }
            })
            .collect();

        let total_paid: Decimal = totals.iter().map(|t| t.total_paid).sum();
        let paid_in_full = !totals.is_empty() && total_paid == order.total_charge;
        (totals, total_paid, order.invoice_status.settle(paid_in_full))
    }

    /// Receiving part: received and ordered totals and the receiving status.
    #[must_use]
    pub fn receiving(
        order: &PurchaseOrderSnapshot,
        receivings: &[ReceivingSnapshot],
    ) -> (i64, i64, DocumentStatus) {
        let received: i64 = receivings
            .iter()
            .filter(|r| !r.is_deleted)
            .flat_map(|r| &r.lines)
            .map(|line| line.quantity)
            .sum();
        let ordered: i64 = order.lines.iter().map(|line| line.quantity).sum();
        let complete = !order.lines.is_empty() && received == ordered;
        (received, ordered, order.receiving_status.settle(complete))
    }

    /// Document part: finished once both invoicing and receiving are finished.
    #[must_use]
    pub fn document(
        status: DocumentStatus,
        invoice_status: DocumentStatus,
        receiving_status: DocumentStatus,
    ) -> DocumentStatus {
        status.settle(
            invoice_status == DocumentStatus::Finished
                && receiving_status == DocumentStatus::Finished,
        )
    }

    /// Full rollup of a purchase order.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCancelled` for a cancelled order.
    pub fn rollup(
        order: &PurchaseOrderSnapshot,
        invoices: &[InvoiceSnapshot],
        receivings: &[ReceivingSnapshot],
    ) -> Result<PurchaseRollup, PurchaseError> {
        if order.status == DocumentStatus::Cancelled {
            return Err(PurchaseError::AlreadyCancelled(order.id));
        }
        let (invoice_totals, total_paid, invoice_status) = Self::invoices(order, invoices);
        let (total_received, total_ordered, receiving_status) = Self::receiving(order, receivings);

        Ok(PurchaseRollup {
            invoices: invoice_totals,
            total_paid,
            invoice_status,
            total_received,
            total_ordered,
            receiving_status,
            status: Self::document(order.status, invoice_status, receiving_status),
        })
    }

    /// Writes a rollup back into the snapshots it was computed from.
    pub fn apply(
        rollup: &PurchaseRollup,
        order: &mut PurchaseOrderSnapshot,
        invoices: &mut [InvoiceSnapshot],
    ) {
        order.total_paid = rollup.total_paid;
        order.invoice_status = rollup.invoice_status;
        order.receiving_status = rollup.receiving_status;
        order.status = rollup.status;
        for totals in &rollup.invoices {
            if let Some(invoice) = invoices.iter_mut().find(|i| i.id == totals.invoice_id) {
                invoice.total_paid = totals.total_paid;
                invoice.status = totals.status;
            }
        }
    }
}
