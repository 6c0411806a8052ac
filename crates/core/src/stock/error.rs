//! Stock ledger error types.
//!
//! This module defines all error types that can occur while recording,
//! allocating and reversing stock movements.

use rust_decimal::Decimal;
use thiserror::Error;

use stockflow_shared::AppError;
use stockflow_shared::types::{LotId, VariantId};

use crate::stock::types::StockReference;

/// Errors that can occur during stock operations.
#[derive(Debug, Error)]
pub enum StockError {
    /// Quantity was zero or negative.
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    /// Unit cost was negative, or too large to price the quantity.
    #[error("Invalid unit cost {0}")]
    InvalidUnitCost(Decimal),

    /// Pricing a draw overflowed the decimal range.
    #[error("Stock cost exceeds the representable range")]
    CostOverflow,

    /// Not enough remaining stock across the variant's lots.
    #[error("Insufficient stock for variant {variant_id}: requested {requested}, available {available}")]
    InsufficientStock {
        /// The variant being drawn from.
        variant_id: VariantId,
        /// The requested quantity.
        requested: i64,
        /// Σ remaining across the variant's lots.
        available: i64,
    },

    /// The variant is not part of the working set.
    #[error("Variant {0} not found")]
    VariantNotFound(VariantId),

    /// The lot is not part of the working set.
    #[error("Lot {0} not found")]
    LotNotFound(LotId),

    /// No movements exist for the document.
    #[error("No stock movements found for {0}")]
    MovementsNotFound(StockReference),

    /// Stock brought in by the document was drawn down by another document.
    #[error("Stock from {reference} in lot {lot_id} was already consumed")]
    StockAlreadyConsumed {
        /// The document being reversed.
        reference: StockReference,
        /// The lot that was drained.
        lot_id: LotId,
    },

    /// Every movement of the document has already been compensated.
    #[error("Stock movements of {0} were already reversed")]
    AlreadyReversed(StockReference),

    /// Persisted stock state disagrees with its own invariants.
    #[error("Stock integrity violation: {0}")]
    IntegrityViolation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl StockError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidQuantity(_) | Self::InvalidUnitCost(_) => 400,
            Self::VariantNotFound(_) | Self::LotNotFound(_) | Self::MovementsNotFound(_) => 404,
            Self::AlreadyReversed(_) => 409,
            Self::InsufficientStock { .. }
            | Self::StockAlreadyConsumed { .. }
            | Self::CostOverflow => 422,
            Self::IntegrityViolation(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::InvalidUnitCost(_) => "INVALID_UNIT_COST",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::CostOverflow => "COST_OVERFLOW",
            Self::VariantNotFound(_) => "VARIANT_NOT_FOUND",
            Self::LotNotFound(_) => "LOT_NOT_FOUND",
            Self::MovementsNotFound(_) => "MOVEMENTS_NOT_FOUND",
            Self::StockAlreadyConsumed { .. } => "STOCK_ALREADY_CONSUMED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::IntegrityViolation(_) => "INTEGRITY_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        let message = err.to_string();
        match err {
            StockError::VariantNotFound(_)
            | StockError::LotNotFound(_)
            | StockError::MovementsNotFound(_) => Self::NotFound(message),
            StockError::AlreadyReversed(_) => Self::Conflict(message),
            StockError::InvalidQuantity(_)
            | StockError::InvalidUnitCost(_)
            | StockError::InsufficientStock { .. }
            | StockError::StockAlreadyConsumed { .. }
            | StockError::CostOverflow => Self::BusinessRule(message),
            StockError::Database(_) => Self::Database(message),
            StockError::IntegrityViolation(_) => Self::Internal(message),
        }
    }
}
