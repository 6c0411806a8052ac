//! Purchase-order cancellation.
//!
//! Cancelling takes back every unit the order brought into stock, cancels its
//! financial footprint on the supplier and soft-deletes the dependent
//! documents. The stock check runs before anything is touched; if any received
//! unit was already sold the order stays as it is.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stockflow_shared::ValidationErrors;
use stockflow_shared::types::{
    FinanceExpenseId, PartnerId, PurchaseInvoiceId, PurchaseOrderId, ReceivingId,
};

use crate::purchasing::error::PurchaseError;
use crate::purchasing::types::{InvoiceSnapshot, PurchaseOrderSnapshot, ReceivingSnapshot};
use crate::status::DocumentStatus;
use crate::stock::{Movement, ReversalEngine, StockBook, StockError, StockReference};

/// Everything a cancellation changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationPlan {
    /// The cancelled order.
    pub order_id: PurchaseOrderId,
    /// Trimmed cancellation note.
    pub note: String,
    /// Supplier whose totals shrink.
    pub supplier_id: PartnerId,
    /// Subtracted from the supplier's total expenditure.
    pub expenditure_reduction: Decimal,
    /// Subtracted from the supplier's total credit.
    pub credit_reduction: Decimal,
    /// Receivings whose stock was reversed; all are soft-deleted.
    pub deleted_receivings: Vec<ReceivingId>,
    /// Invoices to soft-delete.
    pub deleted_invoices: Vec<PurchaseInvoiceId>,
    /// Expenses to soft-delete.
    pub deleted_expenses: Vec<FinanceExpenseId>,
    /// Compensating movements written.
    pub movements: Vec<Movement>,
}

/// Stateless cancellation workflow.
pub struct PurchaseCancellation;

impl PurchaseCancellation {
    /// # Errors
    ///
    /// Returns `AlreadyCancelled` for a cancelled order.
    pub fn guard(order: &PurchaseOrderSnapshot) -> Result<(), PurchaseError> {
        if order.status == DocumentStatus::Cancelled {
            return Err(PurchaseError::AlreadyCancelled(order.id));
        }
        Ok(())
    }

    /// Checks that every unit the order brought in can still be taken back.
    ///
    /// Covers movements booked on the order itself and, once receiving has
    /// started, on each live receiving. Documents without movements, or whose
    /// movements were already reversed, pass.
    ///
    /// # Errors
    ///
    /// Returns `ItemAlreadySold` naming the first drained lot.
    pub fn check_reversible(
        order: &PurchaseOrderSnapshot,
        receivings: &[ReceivingSnapshot],
        book: &StockBook,
    ) -> Result<(), PurchaseError> {
        for reference in Self::references(order, receivings) {
            match ReversalEngine::check(book, reference) {
                Ok(_)
                | Err(StockError::MovementsNotFound(_) | StockError::AlreadyReversed(_)) => {}
                Err(err) => return Err(PurchaseError::from_reversal(err)),
            }
        }
        Ok(())
    }

    /// Cancels the order against the working set.
    ///
    /// # Errors
    ///
    /// - `AlreadyCancelled` if the order is cancelled
    /// - `Validation` if `note` is blank
    /// - `ItemAlreadySold` if received stock was sold
    pub fn cancel(
        order: &PurchaseOrderSnapshot,
        receivings: &[ReceivingSnapshot],
        invoices: &[InvoiceSnapshot],
        note: &str,
        book: &mut StockBook,
        at: DateTime<Utc>,
    ) -> Result<CancellationPlan, PurchaseError> {
        Self::guard(order)?;
        let note = note.trim();
        if note.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.add("note", "REQUIRED", "a cancellation note is required");
            return Err(errors.into());
        }
        Self::check_reversible(order, receivings, book)?;

        let movements = book.atomically(|book| -> Result<Vec<Movement>, PurchaseError> {
            let mut written = Vec::new();
            for reference in Self::references(order, receivings) {
                match ReversalEngine::reverse(book, reference, at) {
                    Ok(movements) => written.extend(movements),
                    Err(StockError::MovementsNotFound(_) | StockError::AlreadyReversed(_)) => {}
                    Err(err) => return Err(PurchaseError::from_reversal(err)),
                }
            }
            Ok(written)
        })?;

        let deleted_receivings = if order.receiving_status.has_progressed() {
            Self::live_receivings(receivings).map(|r| r.id).collect()
        } else {
            Vec::new()
        };

        let (credit_reduction, deleted_invoices, deleted_expenses) =
            if order.invoice_status.has_progressed() {
                let live: Vec<&InvoiceSnapshot> =
                    invoices.iter().filter(|i| !i.is_deleted).collect();
                let expenses = live
                    .iter()
                    .filter(|i| i.status.has_progressed())
                    .flat_map(|i| &i.expenses)
                    .filter(|e| !e.is_deleted)
                    .map(|e| e.id)
                    .collect();
                (
                    order.total_charge - order.total_paid,
                    live.iter().map(|i| i.id).collect(),
                    expenses,
                )
            } else {
                (Decimal::ZERO, Vec::new(), Vec::new())
            };

        Ok(CancellationPlan {
            order_id: order.id,
            note: note.to_string(),
            supplier_id: order.supplier_id,
            expenditure_reduction: order.total_charge,
            credit_reduction,
            deleted_receivings,
            deleted_invoices,
            deleted_expenses,
            movements,
        })
    }

    fn live_receivings(
        receivings: &[ReceivingSnapshot],
    ) -> impl Iterator<Item = &ReceivingSnapshot> {
        receivings.iter().filter(|r| !r.is_deleted)
    }

    fn references(
        order: &PurchaseOrderSnapshot,
        receivings: &[ReceivingSnapshot],
    ) -> Vec<StockReference> {
        let mut references = vec![StockReference::PurchaseOrder(order.id)];
        if order.receiving_status.has_progressed() {
            references.extend(
                Self::live_receivings(receivings).map(|r| StockReference::Receiving(r.id)),
            );
        }
        references
    }
}
