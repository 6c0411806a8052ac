//! Purchasing error types.

use thiserror::Error;

use stockflow_shared::types::{
    FinanceExpenseId, LotId, PartnerId, PurchaseInvoiceId, PurchaseOrderId,
};
use stockflow_shared::{AppError, ValidationErrors};

use crate::stock::{StockError, StockReference};

/// Errors that can occur during purchasing workflows.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// Purchase order not found or soft-deleted.
    #[error("Purchase order {0} not found")]
    NotFound(PurchaseOrderId),

    /// The purchase order was cancelled.
    #[error("Purchase order {0} is already cancelled")]
    AlreadyCancelled(PurchaseOrderId),

    /// Stock received under the order was already sold.
    #[error("Items received under {reference} were already sold from lot {lot_id}")]
    ItemAlreadySold {
        /// The receiving or purchase order whose stock is gone.
        reference: StockReference,
        /// The drained lot.
        lot_id: LotId,
    },

    /// Invoice not found or soft-deleted.
    #[error("Purchase invoice {0} not found")]
    InvoiceNotFound(PurchaseInvoiceId),

    /// Expense not found or soft-deleted.
    #[error("Finance expense {0} not found")]
    ExpenseNotFound(FinanceExpenseId),

    /// The expense was already cleared.
    #[error("Finance expense {0} is already cleared")]
    ExpenseAlreadyCleared(FinanceExpenseId),

    /// Supplier not found.
    #[error("Partner {0} not found")]
    PartnerNotFound(PartnerId),

    /// Input validation failed.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Stock ledger error.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PurchaseError {
    /// Maps a stock error raised while unwinding the order.
    ///
    /// Consumed stock becomes `ItemAlreadySold`; everything else is wrapped.
    #[must_use]
    pub fn from_reversal(err: StockError) -> Self {
        match err {
            StockError::StockAlreadyConsumed { reference, lot_id } => {
                Self::ItemAlreadySold { reference, lot_id }
            }
            other => Self::Stock(other),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_)
            | Self::InvoiceNotFound(_)
            | Self::ExpenseNotFound(_)
            | Self::PartnerNotFound(_) => 404,
            Self::AlreadyCancelled(_) | Self::ExpenseAlreadyCleared(_) => 409,
            Self::ItemAlreadySold { .. } | Self::Validation(_) => 422,
            Self::Stock(err) => err.http_status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "PURCHASE_ORDER_NOT_FOUND",
            Self::AlreadyCancelled(_) => "ALREADY_CANCELLED",
            Self::ItemAlreadySold { .. } => "ITEM_ALREADY_SOLD",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::ExpenseAlreadyCleared(_) => "EXPENSE_ALREADY_CLEARED",
            Self::PartnerNotFound(_) => "PARTNER_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Stock(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<ValidationErrors> for PurchaseError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<PurchaseError> for AppError {
    fn from(err: PurchaseError) -> Self {
        let message = err.to_string();
        match err {
            PurchaseError::NotFound(_)
            | PurchaseError::InvoiceNotFound(_)
            | PurchaseError::ExpenseNotFound(_)
            | PurchaseError::PartnerNotFound(_) => Self::NotFound(message),
            PurchaseError::AlreadyCancelled(_) | PurchaseError::ExpenseAlreadyCleared(_) => {
                Self::Conflict(message)
            }
            PurchaseError::ItemAlreadySold { .. } => Self::BusinessRule(message),
            PurchaseError::Validation(errors) => Self::Validation(errors),
            PurchaseError::Stock(err) => err.into(),
            PurchaseError::Database(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockflow_shared::types::ReceivingId;

    #[test]
    fn test_consumed_stock_maps_to_item_already_sold() {
        let reference = StockReference::Receiving(ReceivingId::new());
        let lot_id = LotId::new();
        let err =
            PurchaseError::from_reversal(StockError::StockAlreadyConsumed { reference, lot_id });

        assert!(matches!(err, PurchaseError::ItemAlreadySold { .. }));
        assert_eq!(err.error_code(), "ITEM_ALREADY_SOLD");
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn test_other_stock_errors_are_wrapped() {
        let err = PurchaseError::from_reversal(StockError::IntegrityViolation("x".into()));
        assert_eq!(err.error_code(), "INTEGRITY_VIOLATION");
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_already_cancelled_is_conflict() {
        let app: AppError = PurchaseError::AlreadyCancelled(PurchaseOrderId::new()).into();
        assert_eq!(app.status_code(), 409);
    }
}
