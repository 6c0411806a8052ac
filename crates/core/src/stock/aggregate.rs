//! Derived stock quantities.
//!
//! Lot remaining and variant available are caches. The movement history is the
//! source of truth; these helpers recompute the caches from it.

use std::collections::BTreeMap;

use stockflow_shared::types::{LotId, VariantId};

use crate::stock::error::StockError;
use crate::stock::types::{Lot, Movement};

/// Recomputed caches for a set of lots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replay {
    /// Remaining per lot.
    pub lot_remaining: BTreeMap<LotId, i64>,
    /// Available per variant.
    pub variant_available: BTreeMap<VariantId, i64>,
}

/// Stateless aggregate calculator.
pub struct StockAggregator;

impl StockAggregator {
    /// Σ in − Σ out over a lot's movements.
    #[must_use]
    pub fn lot_remaining<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> i64 {
        movements.into_iter().map(Movement::signed_quantity).sum()
    }

    /// Σ remaining over a variant's lots.
    #[must_use]
    pub fn variant_available<'a>(lots: impl IntoIterator<Item = &'a Lot>) -> i64 {
        lots.into_iter().map(|lot| lot.remaining).sum()
    }

    /// Replays every lot's movements in sequence order.
    ///
    /// Variants of every given lot appear in the result, with zero when their
    /// lots are empty.
    ///
    /// # Errors
    ///
    /// - `LotNotFound` if a movement points at a lot that is not in `lots`
    /// - `IntegrityViolation` if a lot's running remaining ever drops below zero
    pub fn replay(lots: &[Lot], movements: &[Movement]) -> Result<Replay, StockError> {
        let mut by_lot: BTreeMap<LotId, Vec<&Movement>> =
            lots.iter().map(|lot| (lot.id, Vec::new())).collect();

        for movement in movements {
            by_lot
                .get_mut(&movement.lot_id)
                .ok_or(StockError::LotNotFound(movement.lot_id))?
                .push(movement);
        }

        let mut replay = Replay::default();
        for lot in lots {
            let mut history = by_lot.remove(&lot.id).unwrap_or_default();
            history.sort_by_key(|m| m.sequence);

            let mut running = 0i64;
            for movement in history {
                running += movement.signed_quantity();
                if running < 0 {
                    return Err(StockError::IntegrityViolation(format!(
                        "lot {} drops to {running} at movement {} (sequence {})",
                        lot.code, movement.id, movement.sequence
                    )));
                }
            }

            replay.lot_remaining.insert(lot.id, running);
            *replay.variant_available.entry(lot.variant_id).or_insert(0) += running;
        }

        Ok(replay)
    }
}
