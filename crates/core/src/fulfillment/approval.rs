//! Fulfillment approval.
//!
//! Approval runs in three steps:
//! 1. Guard the fulfillment's status.
//! 2. Check feasibility against available minus committed stock, read-only.
//! 3. Commit: draw stock for every line, cost it, and roll the sales order up.
//!
//! The commit runs inside [`StockBook::atomically`], so a failure on any line
//! leaves the working set as it was.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stockflow_shared::types::{FulfillmentId, FulfillmentItemId, SalesOrderItemId, VariantId};

use crate::fulfillment::error::FulfillmentError;
use crate::fulfillment::rollup::SalesOrderRollup;
use crate::fulfillment::types::{Fulfillment, FulfillmentLine, SalesOrderProgress};
use crate::status::DocumentStatus;
use crate::stock::{Movement, StockBook, StockError, StockReference};

/// Cost of one approved line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineCost {
    /// Fulfillment item id.
    pub line_id: FulfillmentItemId,
    /// Sales-order line shipped.
    pub sales_order_item_id: SalesOrderItemId,
    /// Quantity shipped.
    pub quantity: i64,
    /// Σ quantity × unit cost over the lots drawn.
    pub cost: Decimal,
}

/// Everything an approval produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalOutcome {
    /// The approved fulfillment.
    pub fulfillment_id: FulfillmentId,
    /// The fulfillment's new status.
    pub status: DocumentStatus,
    /// Per-line costs in line order.
    pub line_costs: Vec<LineCost>,
    /// Σ line costs.
    pub total_cost: Decimal,
    /// `out` movements written, in line then FIFO order.
    pub movements: Vec<Movement>,
    /// The sales order after increments, cost and status rollup.
    pub sales_order: SalesOrderProgress,
}

/// Stateless approval workflow.
pub struct FulfillmentApproval;

impl FulfillmentApproval {
    /// Checks that the fulfillment can be approved at all.
    ///
    /// # Errors
    ///
    /// - `AlreadyFinished` if it was approved before
    /// - `WrongStatus` if it was cancelled
    /// - `NoLines` if there is nothing to ship
    pub fn guard(fulfillment: &Fulfillment) -> Result<(), FulfillmentError> {
        match fulfillment.status {
            DocumentStatus::Finished => Err(FulfillmentError::AlreadyFinished(fulfillment.id)),
            DocumentStatus::Cancelled => Err(FulfillmentError::WrongStatus {
                id: fulfillment.id,
                status: fulfillment.status,
            }),
            DocumentStatus::New | DocumentStatus::Active if fulfillment.lines.is_empty() => {
                Err(FulfillmentError::NoLines(fulfillment.id))
            }
            DocumentStatus::New | DocumentStatus::Active => Ok(()),
        }
    }

    /// Checks every line against its variant's uncommitted stock.
    ///
    /// Lines are grouped by variant. Within a group each line must fit into
    /// `available − running`, where `running` starts at the variant's committed
    /// quantity and grows by every line already checked. The running figure is
    /// local to the check and never stored.
    ///
    /// # Errors
    ///
    /// - `InsufficientStock` naming the first line that does not fit
    /// - `Stock(VariantNotFound)` if a variant is missing from the working set
    pub fn check_feasibility(
        fulfillment: &Fulfillment,
        book: &StockBook,
    ) -> Result<(), FulfillmentError> {
        for (variant_id, lines) in Self::group_by_variant(&fulfillment.lines) {
            let stock = book
                .variant(variant_id)
                .ok_or(StockError::VariantNotFound(variant_id))?;

            let mut running = stock.committed;
            for line in lines {
                let headroom = stock.available - running;
                if headroom < line.quantity {
                    return Err(FulfillmentError::InsufficientStock {
                        line_id: line.id,
                        variant_id,
                        requested: line.quantity,
                        headroom,
                    });
                }
                running += line.quantity;
            }
        }
        Ok(())
    }

    /// Approves a fulfillment against the working set.
    ///
    /// # Errors
    ///
    /// Everything [`Self::guard`] and [`Self::check_feasibility`] return,
    /// `SalesOrderNotFound` if `order` is not the fulfillment's sales order,
    /// and any stock error raised while drawing lots.
    pub fn approve(
        fulfillment: &Fulfillment,
        order: &SalesOrderProgress,
        book: &mut StockBook,
        at: DateTime<Utc>,
    ) -> Result<ApprovalOutcome, FulfillmentError> {
        Self::guard(fulfillment)?;
        if order.id != fulfillment.sales_order_id {
            return Err(FulfillmentError::SalesOrderNotFound(fulfillment.sales_order_id));
        }
        Self::check_feasibility(fulfillment, book)?;

        let reference = StockReference::Fulfillment(fulfillment.id);
        book.atomically(|book| -> Result<ApprovalOutcome, FulfillmentError> {
            let mut line_costs = Vec::with_capacity(fulfillment.lines.len());
            let mut movements = Vec::new();
            let mut total_cost = Decimal::ZERO;
            for line in &fulfillment.lines {
                let out = book.stock_out(line.variant_id, line.quantity, reference, at)?;
                total_cost = total_cost
                    .checked_add(out.cost)
                    .ok_or(StockError::CostOverflow)?;
                line_costs.push(LineCost {
                    line_id: line.id,
                    sales_order_item_id: line.sales_order_item_id,
                    quantity: line.quantity,
                    cost: out.cost,
                });
                movements.extend(out.movements);
            }

            let mut sales_order = order.clone();
            SalesOrderRollup::record_fulfilled(&mut sales_order, &fulfillment.lines)?;
            sales_order.total_cost = sales_order
                .total_cost
                .checked_add(total_cost)
                .ok_or(StockError::CostOverflow)?;
            sales_order.status = SalesOrderRollup::status(&sales_order);

            Ok(ApprovalOutcome {
                fulfillment_id: fulfillment.id,
                status: DocumentStatus::Finished,
                line_costs,
                total_cost,
                movements,
                sales_order,
            })
        })
    }

    fn group_by_variant(lines: &[FulfillmentLine]) -> Vec<(VariantId, Vec<&FulfillmentLine>)> {
        let mut groups: Vec<(VariantId, Vec<&FulfillmentLine>)> = Vec::new();
        for line in lines {
            match groups.iter_mut().find(|(variant_id, _)| *variant_id == line.variant_id) {
                Some((_, group)) => group.push(line),
                None => groups.push((line.variant_id, vec![line])),
            }
        }
        groups
    }
}
