//! Goods receipt against a purchase order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use stockflow_shared::types::{ReceivingId, ReceivingItemId};

use crate::purchasing::error::PurchaseError;
use crate::purchasing::rollup::PurchaseStatusRollup;
use crate::purchasing::types::{
    PurchaseOrderSnapshot, ReceivingDraftLine, ReceivingLine, ReceivingSnapshot,
};
use crate::status::DocumentStatus;
use crate::stock::{StockBook, StockIn, StockInRequest, StockReference};
use crate::validation::{LineRequest, Outstanding, validate_lines};

/// Everything a receiving produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivingOutcome {
    /// The new receiving.
    pub receiving: ReceivingSnapshot,
    /// One new lot per line.
    pub stock: Vec<StockIn>,
    /// The order's receiving status after the rollup.
    pub receiving_status: DocumentStatus,
    /// The order's document status after the rollup.
    pub status: DocumentStatus,
}

/// Stateless receiving workflow.
pub struct PurchaseReceiving;

impl PurchaseReceiving {
    /// Receives goods against a purchase order.
    ///
    /// Each line must receive a positive quantity against a line of the order
    /// without exceeding what is still outstanding across earlier receivings.
    /// Each line creates its own lot costed at the order line's unit price.
    ///
    /// # Errors
    ///
    /// - `AlreadyCancelled` for a cancelled order
    /// - `Validation` carrying every failed line check
    /// - `Stock` if a line's variant is missing from the working set
    pub fn receive(
        order: &PurchaseOrderSnapshot,
        existing: &[ReceivingSnapshot],
        lines: &[ReceivingDraftLine],
        book: &mut StockBook,
        at: DateTime<Utc>,
    ) -> Result<ReceivingOutcome, PurchaseError> {
        if order.status == DocumentStatus::Cancelled {
            return Err(PurchaseError::AlreadyCancelled(order.id));
        }

        let mut received: BTreeMap<_, i64> = BTreeMap::new();
        for line in existing.iter().filter(|r| !r.is_deleted).flat_map(|r| &r.lines) {
            *received.entry(line.purchase_order_item_id).or_default() += line.quantity;
        }
        let outstanding: BTreeMap<_, _> = order
            .lines
            .iter()
            .map(|line| {
                (
                    line.id,
                    Outstanding {
                        ordered: line.quantity,
                        consumed: received.get(&line.id).copied().unwrap_or(0),
                    },
                )
            })
            .collect();
        let requests: Vec<LineRequest<_>> = lines
            .iter()
            .map(|line| LineRequest {
                key: line.purchase_order_item_id,
                quantity: line.quantity,
            })
            .collect();
        validate_lines(&requests, &outstanding, "purchase_order_item_id")?;

        let receiving_id = ReceivingId::new();
        let reference = StockReference::Receiving(receiving_id);
        let receiving_lines: Vec<ReceivingLine> = lines
            .iter()
            .filter_map(|line| {
                order.line(line.purchase_order_item_id).map(|ordered| ReceivingLine {
                    id: ReceivingItemId::new(),
                    purchase_order_item_id: ordered.id,
                    variant_id: ordered.variant_id,
                    quantity: line.quantity,
                    unit_cost: ordered.unit_price,
                })
            })
            .collect();

        let stock = book.atomically(|book| -> Result<Vec<StockIn>, PurchaseError> {
            let mut stock = Vec::with_capacity(receiving_lines.len());
            for line in &receiving_lines {
                stock.push(book.stock_in(
                    StockInRequest {
                        variant_id: line.variant_id,
                        quantity: line.quantity,
                        unit_cost: line.unit_cost,
                        reference,
                    },
                    at,
                )?);
            }
            Ok(stock)
        })?;

        let receiving = ReceivingSnapshot {
            id: receiving_id,
            is_deleted: false,
            lines: receiving_lines,
        };

        let mut progressed = order.clone();
        progressed.receiving_status = order.receiving_status.activate();
        progressed.status = order.status.activate();
        let mut all = existing.to_vec();
        all.push(receiving.clone());
        let (_, _, receiving_status) = PurchaseStatusRollup::receiving(&progressed, &all);
        let status = PurchaseStatusRollup::document(
            progressed.status,
            order.invoice_status,
            receiving_status,
        );

        Ok(ReceivingOutcome {
            receiving,
            stock,
            receiving_status,
            status,
        })
    }
}
