//! FIFO allocation of an outbound quantity across a variant's lots.

use rust_decimal::Decimal;

use stockflow_shared::types::{LotId, VariantId};

use crate::stock::error::StockError;
use crate::stock::types::Lot;

/// Quantity drawn from a single lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotAllocation {
    /// Lot drawn from.
    pub lot_id: LotId,
    /// Quantity taken from the lot.
    pub quantity: i64,
    /// The lot's unit cost.
    pub unit_cost: Decimal,
}

impl LotAllocation {
    /// Cost of this slice: `quantity × unit_cost`, `None` on overflow.
    #[must_use]
    pub fn cost(&self) -> Option<Decimal> {
        self.unit_cost.checked_mul(Decimal::from(self.quantity))
    }
}

/// Stateless FIFO allocator.
pub struct LotAllocator;

impl LotAllocator {
    /// Plans how `requested` units of `variant_id` are drawn from `lots`.
    ///
    /// Lots of the variant with remaining stock are visited oldest first
    /// (creation time, then lot id) and each takes `min(remaining, still_needed)`.
    /// Lots of other variants are ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `requested` is not positive
    /// - `InsufficientStock` if the lots together hold less than `requested`
    pub fn plan<'a>(
        variant_id: VariantId,
        lots: impl IntoIterator<Item = &'a Lot>,
        requested: i64,
    ) -> Result<Vec<LotAllocation>, StockError> {
        if requested <= 0 {
            return Err(StockError::InvalidQuantity(requested));
        }

        let mut candidates: Vec<&Lot> = lots
            .into_iter()
            .filter(|lot| lot.variant_id == variant_id && lot.remaining > 0)
            .collect();
        candidates.sort_by_key(|lot| lot.fifo_key());

        let available: i64 = candidates.iter().map(|lot| lot.remaining).sum();
        if available < requested {
            return Err(StockError::InsufficientStock {
                variant_id,
                requested,
                available,
            });
        }

        let mut still_needed = requested;
        let mut allocations = Vec::new();
        for lot in candidates {
            if still_needed == 0 {
                break;
            }
            let take = lot.remaining.min(still_needed);
            allocations.push(LotAllocation {
                lot_id: lot.id,
                quantity: take,
                unit_cost: lot.unit_cost,
            });
            still_needed -= take;
        }

        Ok(allocations)
    }

    /// Total cost of a plan.
    ///
    /// # Errors
    ///
    /// Returns `CostOverflow` if a slice or the sum leaves the decimal range.
    pub fn total_cost(allocations: &[LotAllocation]) -> Result<Decimal, StockError> {
        allocations.iter().try_fold(Decimal::ZERO, |total, allocation| {
            allocation
                .cost()
                .and_then(|cost| total.checked_add(cost))
                .ok_or(StockError::CostOverflow)
        })
    }
}
