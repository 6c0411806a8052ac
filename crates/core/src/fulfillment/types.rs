//! Fulfillment domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockflow_shared::types::{
    FulfillmentId, FulfillmentItemId, SalesOrderId, SalesOrderItemId, VariantId,
};

use crate::status::DocumentStatus;

/// A line of a fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentLine {
    /// Fulfillment item id.
    pub id: FulfillmentItemId,
    /// Sales-order line being shipped.
    pub sales_order_item_id: SalesOrderItemId,
    /// Variant shipped.
    pub variant_id: VariantId,
    /// Quantity shipped.
    pub quantity: i64,
}

/// A fulfillment and its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    /// Fulfillment id.
    pub id: FulfillmentId,
    /// Sales order being fulfilled.
    pub sales_order_id: SalesOrderId,
    /// Current status.
    pub status: DocumentStatus,
    /// Lines in entry order.
    pub lines: Vec<FulfillmentLine>,
}

/// A sales-order line with its fulfillment progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderLine {
    /// Sales-order item id.
    pub id: SalesOrderItemId,
    /// Variant ordered.
    pub variant_id: VariantId,
    /// Quantity ordered.
    pub quantity: i64,
    /// Quantity shipped so far.
    pub fulfilled_quantity: i64,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

/// A sales order as seen by the fulfillment workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderProgress {
    /// Sales order id.
    pub id: SalesOrderId,
    /// Fulfillment status of the order.
    pub status: DocumentStatus,
    /// Σ cost of approved fulfillments.
    pub total_cost: Decimal,
    /// Order lines.
    pub items: Vec<SalesOrderLine>,
}

impl SalesOrderProgress {
    /// Looks up a live (not soft-deleted) line.
    #[must_use]
    pub fn item(&self, id: SalesOrderItemId) -> Option<&SalesOrderLine> {
        self.items.iter().find(|item| item.id == id && !item.is_deleted)
    }
}

/// A requested line of a new fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    /// Sales-order line to ship.
    pub sales_order_item_id: SalesOrderItemId,
    /// Quantity to ship.
    pub quantity: i64,
}
