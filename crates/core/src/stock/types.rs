//! Stock ledger domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use stockflow_shared::types::{
    DirectPlacementId, FulfillmentId, LotId, MovementId, PurchaseOrderId, ReceivingId,
    StockopnameId, VariantId,
};

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    /// Quantity added to a lot.
    In,
    /// Quantity removed from a lot.
    Out,
}

impl MovementDirection {
    /// Returns the string representation of the direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }

    /// The direction a compensating movement uses.
    #[must_use]
    pub fn opposite(&self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
        }
    }

    /// Applies the direction to a positive quantity.
    #[must_use]
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            Self::In => quantity,
            Self::Out => -quantity,
        }
    }
}

impl fmt::Display for MovementDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of business document a movement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Goods received against a purchase order.
    Receiving,
    /// Stock placed directly without a purchase order.
    DirectPlacement,
    /// Physical count adjustment.
    Stockopname,
    /// Movements booked directly against a purchase order.
    PurchaseOrder,
    /// Goods shipped for a sales order.
    Fulfillment,
}

impl ReferenceKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receiving => "receiving",
            Self::DirectPlacement => "direct_placement",
            Self::Stockopname => "stockopname",
            Self::PurchaseOrder => "purchase_order",
            Self::Fulfillment => "fulfillment",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The business document that caused a movement.
///
/// A closed set: adding a document kind forces every match on it to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StockReference {
    /// A receiving document.
    Receiving(ReceivingId),
    /// A direct placement.
    DirectPlacement(DirectPlacementId),
    /// A stock opname.
    Stockopname(StockopnameId),
    /// A purchase order.
    PurchaseOrder(PurchaseOrderId),
    /// A fulfillment.
    Fulfillment(FulfillmentId),
}

impl StockReference {
    /// The kind of document referenced.
    #[must_use]
    pub const fn kind(&self) -> ReferenceKind {
        match self {
            Self::Receiving(_) => ReferenceKind::Receiving,
            Self::DirectPlacement(_) => ReferenceKind::DirectPlacement,
            Self::Stockopname(_) => ReferenceKind::Stockopname,
            Self::PurchaseOrder(_) => ReferenceKind::PurchaseOrder,
            Self::Fulfillment(_) => ReferenceKind::Fulfillment,
        }
    }

    /// The raw document id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Receiving(id) => id.0,
            Self::DirectPlacement(id) => id.0,
            Self::Stockopname(id) => id.0,
            Self::PurchaseOrder(id) => id.0,
            Self::Fulfillment(id) => id.0,
        }
    }

    /// Rebuilds a reference from its stored kind and id.
    #[must_use]
    pub const fn from_parts(kind: ReferenceKind, id: Uuid) -> Self {
        match kind {
            ReferenceKind::Receiving => Self::Receiving(ReceivingId::from_uuid(id)),
            ReferenceKind::DirectPlacement => {
                Self::DirectPlacement(DirectPlacementId::from_uuid(id))
            }
            ReferenceKind::Stockopname => Self::Stockopname(StockopnameId::from_uuid(id)),
            ReferenceKind::PurchaseOrder => Self::PurchaseOrder(PurchaseOrderId::from_uuid(id)),
            ReferenceKind::Fulfillment => Self::Fulfillment(FulfillmentId::from_uuid(id)),
        }
    }
}

impl fmt::Display for StockReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// A batch of a variant received at a single unit cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Lot id.
    pub id: LotId,
    /// Variant the lot holds.
    pub variant_id: VariantId,
    /// Human-readable lot code.
    pub code: String,
    /// Cost per unit, fixed at creation.
    pub unit_cost: Decimal,
    /// Creation time; FIFO allocation orders by it.
    pub created_at: DateTime<Utc>,
    /// Cached remaining quantity (Σ in − Σ out over the lot's movements).
    pub remaining: i64,
}

impl Lot {
    /// Creates an empty lot with a generated code.
    #[must_use]
    pub fn new(variant_id: VariantId, unit_cost: Decimal, created_at: DateTime<Utc>) -> Self {
        let id = LotId::new();
        Self {
            id,
            variant_id,
            code: Self::generate_code(id, created_at),
            unit_cost,
            created_at,
            remaining: 0,
        }
    }

    /// Generates a lot code such as `LOT-20260115-1A2B3C4D`.
    ///
    /// The suffix is the tail of the lot id, so codes are unique per lot.
    #[must_use]
    pub fn generate_code(id: LotId, created_at: DateTime<Utc>) -> String {
        let simple = id.0.simple().to_string().to_uppercase();
        let suffix = &simple[simple.len() - 8..];
        format!("LOT-{}-{suffix}", created_at.format("%Y%m%d"))
    }

    /// FIFO sort key.
    #[must_use]
    pub fn fifo_key(&self) -> (DateTime<Utc>, LotId) {
        (self.created_at, self.id)
    }
}

/// An append-only change to one lot's remaining quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Movement id.
    pub id: MovementId,
    /// Lot the movement applies to.
    pub lot_id: LotId,
    /// Position within the lot's movement history, starting at 1.
    pub sequence: i64,
    /// In or out.
    pub direction: MovementDirection,
    /// Always positive.
    pub quantity: i64,
    /// Lot remaining immediately after this movement.
    pub remaining_after: i64,
    /// Business document that caused the movement.
    pub reference: StockReference,
    /// The original movement this one compensates, if it is a reversal.
    pub reverses_movement_id: Option<MovementId>,
    /// When the movement was recorded.
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Quantity with the direction's sign applied.
    #[must_use]
    pub fn signed_quantity(&self) -> i64 {
        self.direction.signed(self.quantity)
    }

    /// Returns true if this movement compensates another one.
    #[must_use]
    pub const fn is_reversal(&self) -> bool {
        self.reverses_movement_id.is_some()
    }
}

/// Stock position of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantStock {
    /// Variant id.
    pub variant_id: VariantId,
    /// Σ remaining over the variant's lots.
    pub available: i64,
    /// Quantity reserved by other documents.
    pub committed: i64,
}

impl VariantStock {
    /// A variant with no stock and no reservations.
    #[must_use]
    pub const fn empty(variant_id: VariantId) -> Self {
        Self {
            variant_id,
            available: 0,
            committed: 0,
        }
    }

    /// Quantity that can still be promised: available minus committed.
    #[must_use]
    pub const fn headroom(&self) -> i64 {
        self.available - self.committed
    }
}

/// Input for a stock-in operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockInRequest {
    /// Variant being received.
    pub variant_id: VariantId,
    /// Quantity, must be positive.
    pub quantity: i64,
    /// Unit cost of the new lot, must not be negative.
    pub unit_cost: Decimal,
    /// Document the stock arrives under.
    pub reference: StockReference,
}
