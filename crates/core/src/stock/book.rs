//! In-memory stock working set.
//!
//! A `StockBook` holds the variants, lots and full movement histories a
//! workflow needs. Workflows mutate the book; the persistence layer then takes
//! the recorded changes and writes them inside the same transaction it loaded
//! the book in.
//!
//! The book must hold every lot of each variant it tracks, otherwise the
//! recomputed `available` figure would only cover part of the variant.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use stockflow_shared::types::{LotId, MovementId, VariantId};

use crate::stock::aggregate::StockAggregator;
use crate::stock::allocator::LotAllocator;
use crate::stock::error::StockError;
use crate::stock::types::{
    Lot, Movement, MovementDirection, StockInRequest, StockReference, VariantStock,
};

/// Result of a stock-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockIn {
    /// The lot created for the receipt.
    pub lot: Lot,
    /// The `in` movement that filled it.
    pub movement: Movement,
}

/// Result of a stock-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockOut {
    /// One `out` movement per lot drawn from, in FIFO order.
    pub movements: Vec<Movement>,
    /// Σ quantity × unit cost over the drawn lots.
    pub cost: Decimal,
}

/// Everything a book recorded since the last `take_changes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockChanges {
    /// Lots created by stock-in, with their current remaining.
    pub created_lots: Vec<Lot>,
    /// Pre-existing lots whose remaining changed.
    pub updated_lots: Vec<Lot>,
    /// Newly appended movements in the order they were written.
    pub movements: Vec<Movement>,
    /// Variants whose available quantity was recomputed.
    pub variants: Vec<VariantStock>,
}

impl StockChanges {
    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created_lots.is_empty()
            && self.updated_lots.is_empty()
            && self.movements.is_empty()
            && self.variants.is_empty()
    }
}

/// Working set of the stock ledger.
#[derive(Debug, Clone, Default)]
pub struct StockBook {
    variants: BTreeMap<VariantId, VariantStock>,
    lots: BTreeMap<LotId, Lot>,
    history: BTreeMap<LotId, Vec<Movement>>,
    created_lots: BTreeSet<LotId>,
    touched_lots: BTreeSet<LotId>,
    touched_variants: BTreeSet<VariantId>,
    new_movements: Vec<Movement>,
}

impl StockBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variant to the working set. An already tracked variant is kept.
    pub fn track_variant(&mut self, stock: VariantStock) {
        self.variants.entry(stock.variant_id).or_insert(stock);
    }

    /// Adds a lot and its full movement history. An already tracked lot is kept.
    pub fn track_lot(&mut self, lot: Lot, mut movements: Vec<Movement>) {
        if self.lots.contains_key(&lot.id) {
            return;
        }
        movements.sort_by_key(|m| m.sequence);
        self.history.insert(lot.id, movements);
        self.lots.insert(lot.id, lot);
    }

    /// Looks up a tracked variant.
    #[must_use]
    pub fn variant(&self, variant_id: VariantId) -> Option<&VariantStock> {
        self.variants.get(&variant_id)
    }

    /// Looks up a tracked lot.
    #[must_use]
    pub fn lot(&self, lot_id: LotId) -> Option<&Lot> {
        self.lots.get(&lot_id)
    }

    /// Tracked lots of a variant, in no particular order.
    pub fn lots_of(&self, variant_id: VariantId) -> impl Iterator<Item = &Lot> {
        self.lots
            .values()
            .filter(move |lot| lot.variant_id == variant_id)
    }

    /// A lot's movements in sequence order.
    #[must_use]
    pub fn movements_of(&self, lot_id: LotId) -> &[Movement] {
        self.history.get(&lot_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every movement tagged with `reference`, ordered by time, lot and sequence.
    #[must_use]
    pub fn movements_for(&self, reference: StockReference) -> Vec<&Movement> {
        let mut found: Vec<&Movement> = self
            .history
            .values()
            .flatten()
            .filter(|m| m.reference == reference)
            .collect();
        found.sort_by_key(|m| (m.created_at, m.lot_id, m.sequence));
        found
    }

    /// Available quantity of a variant, zero if untracked.
    #[must_use]
    pub fn available(&self, variant_id: VariantId) -> i64 {
        self.variants.get(&variant_id).map_or(0, |v| v.available)
    }

    /// Receives stock into a new lot.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if the quantity is not positive or would overflow
    ///   the variant's available stock
    /// - `InvalidUnitCost` if the unit cost is negative or the lot cannot be priced
    /// - `VariantNotFound` if the variant is not tracked
    pub fn stock_in(
        &mut self,
        request: StockInRequest,
        at: DateTime<Utc>,
    ) -> Result<StockIn, StockError> {
        if request.quantity <= 0 {
            return Err(StockError::InvalidQuantity(request.quantity));
        }
        if request.unit_cost < Decimal::ZERO
            || request
                .unit_cost
                .checked_mul(Decimal::from(request.quantity))
                .is_none()
        {
            return Err(StockError::InvalidUnitCost(request.unit_cost));
        }
        let Some(stock) = self.variants.get(&request.variant_id) else {
            return Err(StockError::VariantNotFound(request.variant_id));
        };
        if stock.available.checked_add(request.quantity).is_none() {
            return Err(StockError::InvalidQuantity(request.quantity));
        }

        let lot = Lot::new(request.variant_id, request.unit_cost, at);
        let lot_id = lot.id;
        self.lots.insert(lot_id, lot);
        self.history.insert(lot_id, Vec::new());
        self.created_lots.insert(lot_id);

        let movement = self.append(
            lot_id,
            MovementDirection::In,
            request.quantity,
            request.reference,
            None,
            at,
        )?;
        let lot = self
            .lots
            .get(&lot_id)
            .cloned()
            .ok_or(StockError::LotNotFound(lot_id))?;

        Ok(StockIn { lot, movement })
    }

    /// Draws `quantity` units of a variant from its lots in FIFO order.
    ///
    /// Nothing is recorded when the draw fails.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if the quantity is not positive
    /// - `VariantNotFound` if the variant is not tracked
    /// - `InsufficientStock` if the variant's lots hold less than `quantity`
    pub fn stock_out(
        &mut self,
        variant_id: VariantId,
        quantity: i64,
        reference: StockReference,
        at: DateTime<Utc>,
    ) -> Result<StockOut, StockError> {
        if !self.variants.contains_key(&variant_id) {
            return Err(StockError::VariantNotFound(variant_id));
        }
        let plan = LotAllocator::plan(variant_id, self.lots.values(), quantity)?;
        let cost = LotAllocator::total_cost(&plan)?;

        self.atomically(|book| -> Result<StockOut, StockError> {
            let mut movements = Vec::with_capacity(plan.len());
            for allocation in &plan {
                movements.push(book.append(
                    allocation.lot_id,
                    MovementDirection::Out,
                    allocation.quantity,
                    reference,
                    None,
                    at,
                )?);
            }
            Ok(StockOut { movements, cost })
        })
    }

    /// Runs `f` against the book and rolls every change back if it fails.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub fn atomically<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    /// Returns true if anything was recorded since the last `take_changes`.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.new_movements.is_empty() || !self.created_lots.is_empty()
    }

    /// Drains the recorded changes.
    pub fn take_changes(&mut self) -> StockChanges {
        let created = std::mem::take(&mut self.created_lots);
        let touched = std::mem::take(&mut self.touched_lots);
        let variants = std::mem::take(&mut self.touched_variants);

        StockChanges {
            created_lots: created
                .iter()
                .filter_map(|id| self.lots.get(id).cloned())
                .collect(),
            updated_lots: touched
                .difference(&created)
                .filter_map(|id| self.lots.get(id).cloned())
                .collect(),
            movements: std::mem::take(&mut self.new_movements),
            variants: variants
                .iter()
                .filter_map(|id| self.variants.get(id).copied())
                .collect(),
        }
    }

    /// Appends one movement to a lot and refreshes both caches.
    pub(crate) fn append(
        &mut self,
        lot_id: LotId,
        direction: MovementDirection,
        quantity: i64,
        reference: StockReference,
        reverses_movement_id: Option<MovementId>,
        at: DateTime<Utc>,
    ) -> Result<Movement, StockError> {
        if quantity <= 0 {
            return Err(StockError::InvalidQuantity(quantity));
        }
        let variant_id = self
            .lots
            .get(&lot_id)
            .map(|lot| lot.variant_id)
            .ok_or(StockError::LotNotFound(lot_id))?;

        let history = self.history.entry(lot_id).or_default();
        let remaining_after =
            StockAggregator::lot_remaining(history.iter()) + direction.signed(quantity);
        if remaining_after < 0 {
            return Err(StockError::IntegrityViolation(format!(
                "lot {lot_id} would drop to {remaining_after}"
            )));
        }

        let movement = Movement {
            id: MovementId::new(),
            lot_id,
            sequence: history.last().map_or(1, |m| m.sequence + 1),
            direction,
            quantity,
            remaining_after,
            reference,
            reverses_movement_id,
            created_at: at,
        };
        history.push(movement.clone());
        self.new_movements.push(movement.clone());

        if let Some(lot) = self.lots.get_mut(&lot_id) {
            lot.remaining = remaining_after;
        }
        self.touched_lots.insert(lot_id);
        self.refresh_variant(variant_id);

        Ok(movement)
    }

    fn refresh_variant(&mut self, variant_id: VariantId) {
        let available = StockAggregator::variant_available(self.lots_of(variant_id));
        self.variants
            .entry(variant_id)
            .or_insert_with(|| VariantStock::empty(variant_id))
            .available = available;
        self.touched_variants.insert(variant_id);
    }
}
