//! Invoice registration and expense clearing.

use rust_decimal::Decimal;

use stockflow_shared::ValidationErrors;
use stockflow_shared::types::{FinanceExpenseId, PurchaseInvoiceId};

use crate::purchasing::error::PurchaseError;
use crate::purchasing::types::{ExpenseSnapshot, InvoiceSnapshot, PurchaseOrderSnapshot};
use crate::status::{DocumentStatus, ExpenseStatus};

/// Stateless invoicing workflow.
pub struct PurchaseInvoicing;

impl PurchaseInvoicing {
    /// Registers an invoice against an order.
    ///
    /// The amount must be positive and, together with the order's other live
    /// invoices, must not exceed the total charge. The caller moves the order's
    /// invoice and document statuses to `active`.
    ///
    /// # Errors
    ///
    /// - `AlreadyCancelled` for a cancelled order
    /// - `Validation` on a bad amount
    pub fn register_invoice(
        order: &PurchaseOrderSnapshot,
        invoices: &[InvoiceSnapshot],
        amount: Decimal,
    ) -> Result<InvoiceSnapshot, PurchaseError> {
        if order.status == DocumentStatus::Cancelled {
            return Err(PurchaseError::AlreadyCancelled(order.id));
        }

        let invoiced: Decimal = invoices
            .iter()
            .filter(|i| !i.is_deleted)
            .map(|i| i.total_amount)
            .sum();
        let mut errors = ValidationErrors::new();
        if amount <= Decimal::ZERO {
            errors.add("amount", "NOT_POSITIVE", "amount must be positive");
        } else if invoiced
            .checked_add(amount)
            .is_none_or(|total| total > order.total_charge)
        {
            errors.add(
                "amount",
                "EXCEEDS_OUTSTANDING",
                format!(
                    "amount {amount} exceeds uninvoiced charge {}",
                    order.total_charge - invoiced
                ),
            );
        }
        errors.into_result()?;

        Ok(InvoiceSnapshot {
            id: PurchaseInvoiceId::new(),
            total_amount: amount,
            total_paid: Decimal::ZERO,
            status: DocumentStatus::New,
            is_deleted: false,
            expenses: Vec::new(),
        })
    }

    /// Records an uncleared expense against an invoice.
    ///
    /// The amount must be positive and the invoice's live expenses must not
    /// exceed its total. The invoice moves to `active`.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` for a soft-deleted invoice
    /// - `Validation` on a bad amount
    pub fn record_expense(
        invoice: &mut InvoiceSnapshot,
        amount: Decimal,
    ) -> Result<ExpenseSnapshot, PurchaseError> {
        if invoice.is_deleted {
            return Err(PurchaseError::InvoiceNotFound(invoice.id));
        }

        let recorded: Decimal = invoice
            .expenses
            .iter()
            .filter(|e| !e.is_deleted)
            .map(|e| e.amount)
            .sum();
        let mut errors = ValidationErrors::new();
        if amount <= Decimal::ZERO {
            errors.add("amount", "NOT_POSITIVE", "amount must be positive");
        } else if recorded
            .checked_add(amount)
            .is_none_or(|total| total > invoice.total_amount)
        {
            errors.add(
                "amount",
                "EXCEEDS_OUTSTANDING",
                format!(
                    "amount {amount} exceeds unpaid invoice amount {}",
                    invoice.total_amount - recorded
                ),
            );
        }
        errors.into_result()?;

        let expense = ExpenseSnapshot {
            id: FinanceExpenseId::new(),
            amount,
            status: ExpenseStatus::New,
            is_deleted: false,
        };
        invoice.expenses.push(expense.clone());
        invoice.status = invoice.status.activate();
        Ok(expense)
    }

    /// Marks an expense as cleared. The caller runs the rollup afterwards.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` for a soft-deleted invoice
    /// - `ExpenseNotFound` if the expense is not a live expense of the invoice
    /// - `ExpenseAlreadyCleared` if it was cleared before
    pub fn clear_expense(
        invoice: &mut InvoiceSnapshot,
        expense_id: FinanceExpenseId,
    ) -> Result<(), PurchaseError> {
        if invoice.is_deleted {
            return Err(PurchaseError::InvoiceNotFound(invoice.id));
        }
        let expense = invoice
            .expenses
            .iter_mut()
            .find(|e| e.id == expense_id && !e.is_deleted)
            .ok_or(PurchaseError::ExpenseNotFound(expense_id))?;
        if expense.status == ExpenseStatus::Cleared {
            return Err(PurchaseError::ExpenseAlreadyCleared(expense_id));
        }
        expense.status = ExpenseStatus::Cleared;
        invoice.status = invoice.status.activate();
        Ok(())
    }
}
