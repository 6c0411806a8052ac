//! Reversal of a business document's stock movements.
//!
//! Reversing never deletes history. Each original movement gets a compensating
//! movement in the opposite direction that carries the same reference and
//! points back at the original.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use stockflow_shared::types::MovementId;

use crate::stock::book::StockBook;
use crate::stock::error::StockError;
use crate::stock::types::{Movement, MovementDirection, ReferenceKind, StockReference};

/// Stateless reversal engine.
pub struct ReversalEngine;

impl ReversalEngine {
    /// Original movements of `reference` that have not been compensated yet.
    ///
    /// # Errors
    ///
    /// - `MovementsNotFound` if the document never moved stock
    /// - `AlreadyReversed` if every original already has a compensating movement
    pub fn pending(
        book: &StockBook,
        reference: StockReference,
    ) -> Result<Vec<Movement>, StockError> {
        let all = book.movements_for(reference);
        if all.is_empty() {
            return Err(StockError::MovementsNotFound(reference));
        }

        let compensated: BTreeSet<MovementId> =
            all.iter().filter_map(|m| m.reverses_movement_id).collect();
        let originals: Vec<Movement> = all
            .into_iter()
            .filter(|m| !m.is_reversal() && !compensated.contains(&m.id))
            .cloned()
            .collect();

        if originals.is_empty() {
            return Err(StockError::AlreadyReversed(reference));
        }
        Ok(originals)
    }

    /// Whether a single original movement may be compensated.
    ///
    /// Stock brought in by receivings, direct placements and the `in` side of a
    /// stock opname can only be taken back while no other document has drawn
    /// from the lot since. Everything else is always reversible.
    #[must_use]
    pub fn is_reversible(book: &StockBook, original: &Movement) -> bool {
        match original.reference.kind() {
            ReferenceKind::Receiving | ReferenceKind::DirectPlacement => {
                !Self::drained_since(book, original)
            }
            ReferenceKind::Stockopname => match original.direction {
                MovementDirection::In => !Self::drained_since(book, original),
                MovementDirection::Out => true,
            },
            ReferenceKind::PurchaseOrder | ReferenceKind::Fulfillment => true,
        }
    }

    /// Checks that the whole document can be reversed.
    ///
    /// # Errors
    ///
    /// - `MovementsNotFound` / `AlreadyReversed` as for [`Self::pending`]
    /// - `StockAlreadyConsumed` naming the first drained lot
    pub fn check(
        book: &StockBook,
        reference: StockReference,
    ) -> Result<Vec<Movement>, StockError> {
        let originals = Self::pending(book, reference)?;
        if let Some(blocked) = originals.iter().find(|m| !Self::is_reversible(book, m)) {
            return Err(StockError::StockAlreadyConsumed {
                reference,
                lot_id: blocked.lot_id,
            });
        }
        Ok(originals)
    }

    /// Writes a compensating movement for every pending original of `reference`.
    ///
    /// Either every original is compensated or nothing is written. Originals
    /// are compensated newest first so a lot never dips below zero midway.
    ///
    /// # Errors
    ///
    /// Everything [`Self::check`] returns, plus `IntegrityViolation` if a
    /// compensation would drive a lot negative.
    pub fn reverse(
        book: &mut StockBook,
        reference: StockReference,
        at: DateTime<Utc>,
    ) -> Result<Vec<Movement>, StockError> {
        let originals = Self::check(book, reference)?;

        book.atomically(|book| -> Result<Vec<Movement>, StockError> {
            let mut written = Vec::with_capacity(originals.len());
            for original in originals.iter().rev() {
                written.push(book.append(
                    original.lot_id,
                    original.direction.opposite(),
                    original.quantity,
                    reference,
                    Some(original.id),
                    at,
                )?);
            }
            Ok(written)
        })
    }

    fn drained_since(book: &StockBook, original: &Movement) -> bool {
        book.movements_of(original.lot_id).iter().any(|later| {
            later.sequence > original.sequence
                && later.direction == MovementDirection::Out
                && later.reference != original.reference
        })
    }
}
