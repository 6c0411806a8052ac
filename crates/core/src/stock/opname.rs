//! Stock opname: aligning the ledger with a physical count.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use stockflow_shared::types::VariantId;

use crate::stock::book::{StockBook, StockIn, StockOut};
use crate::stock::error::StockError;
use crate::stock::types::{StockInRequest, StockReference};

/// What a count changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountAdjustment {
    /// The count matched the ledger.
    Unchanged,
    /// More was counted than recorded; the surplus went into a new lot.
    Surplus(StockIn),
    /// Less was counted than recorded; the shortage was drawn FIFO.
    Shortage(StockOut),
}

/// Stateless physical-count adjustment.
pub struct StockCount;

impl StockCount {
    /// Moves a variant's available quantity to `counted`.
    ///
    /// A surplus is received at `unit_cost`; a shortage is drawn from the
    /// oldest lots. Both movements carry `reference`.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `counted` is negative
    /// - `VariantNotFound` if the variant is not tracked
    /// - `InvalidUnitCost` on a surplus with a negative unit cost
    pub fn adjust(
        book: &mut StockBook,
        variant_id: VariantId,
        counted: i64,
        unit_cost: Decimal,
        reference: StockReference,
        at: DateTime<Utc>,
    ) -> Result<CountAdjustment, StockError> {
        if counted < 0 {
            return Err(StockError::InvalidQuantity(counted));
        }
        let recorded = book
            .variant(variant_id)
            .ok_or(StockError::VariantNotFound(variant_id))?
            .available;

        match counted - recorded {
            0 => Ok(CountAdjustment::Unchanged),
            surplus if surplus > 0 => book
                .stock_in(
                    StockInRequest {
                        variant_id,
                        quantity: surplus,
                        unit_cost,
                        reference,
                    },
                    at,
                )
                .map(CountAdjustment::Surplus),
            shortage => book
                .stock_out(variant_id, -shortage, reference, at)
                .map(CountAdjustment::Shortage),
        }
    }
}
