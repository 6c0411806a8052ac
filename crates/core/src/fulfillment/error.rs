//! Fulfillment error types.

use thiserror::Error;

use stockflow_shared::types::{
    FulfillmentId, FulfillmentItemId, SalesOrderId, SalesOrderItemId, VariantId,
};
use stockflow_shared::{AppError, ValidationErrors};

use crate::status::DocumentStatus;
use crate::stock::StockError;

/// Errors that can occur during fulfillment workflows.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Fulfillment not found or soft-deleted.
    #[error("Fulfillment {0} not found")]
    NotFound(FulfillmentId),

    /// Sales order not found or soft-deleted.
    #[error("Sales order {0} not found")]
    SalesOrderNotFound(SalesOrderId),

    /// A fulfillment line points at a sales-order line that no longer exists.
    #[error("Sales order item {0} not found")]
    SalesOrderItemNotFound(SalesOrderItemId),

    /// The fulfillment was already approved.
    #[error("Fulfillment {0} is already finished")]
    AlreadyFinished(FulfillmentId),

    /// The fulfillment is in a status that cannot be approved.
    #[error("Fulfillment {id} cannot be approved from status {status}")]
    WrongStatus {
        /// The fulfillment.
        id: FulfillmentId,
        /// Its current status.
        status: DocumentStatus,
    },

    /// The fulfillment has no lines to ship.
    #[error("Fulfillment {0} has no lines")]
    NoLines(FulfillmentId),

    /// A line does not fit into the variant's uncommitted stock.
    #[error(
        "Insufficient stock for line {line_id} (variant {variant_id}): requested {requested}, headroom {headroom}"
    )]
    InsufficientStock {
        /// The overflowing line.
        line_id: FulfillmentItemId,
        /// The variant being shipped.
        variant_id: VariantId,
        /// The line's quantity.
        requested: i64,
        /// Available minus committed, including earlier lines of the same variant.
        headroom: i64,
    },

    /// Draft validation failed.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Stock ledger error.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl FulfillmentError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::SalesOrderNotFound(_) | Self::SalesOrderItemNotFound(_) => {
                404
            }
            Self::AlreadyFinished(_) | Self::WrongStatus { .. } => 409,
            Self::NoLines(_) | Self::InsufficientStock { .. } | Self::Validation(_) => 422,
            Self::Stock(err) => err.http_status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "FULFILLMENT_NOT_FOUND",
            Self::SalesOrderNotFound(_) => "SALES_ORDER_NOT_FOUND",
            Self::SalesOrderItemNotFound(_) => "SALES_ORDER_ITEM_NOT_FOUND",
            Self::AlreadyFinished(_) => "ALREADY_FINISHED",
            Self::WrongStatus { .. } => "WRONG_STATUS",
            Self::NoLines(_) => "NO_LINES",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Stock(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<ValidationErrors> for FulfillmentError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<FulfillmentError> for AppError {
    fn from(err: FulfillmentError) -> Self {
        let message = err.to_string();
        match err {
            FulfillmentError::NotFound(_)
            | FulfillmentError::SalesOrderNotFound(_)
            | FulfillmentError::SalesOrderItemNotFound(_) => Self::NotFound(message),
            FulfillmentError::AlreadyFinished(_) | FulfillmentError::WrongStatus { .. } => {
                Self::Conflict(message)
            }
            FulfillmentError::NoLines(_) | FulfillmentError::InsufficientStock { .. } => {
                Self::BusinessRule(message)
            }
            FulfillmentError::Validation(errors) => Self::Validation(errors),
            FulfillmentError::Stock(err) => err.into(),
            FulfillmentError::Database(_) => Self::Database(message),
        }
    }
}
