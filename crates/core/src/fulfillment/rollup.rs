//! Sales-order fulfillment rollup.

use crate::fulfillment::error::FulfillmentError;
use crate::fulfillment::types::{FulfillmentLine, SalesOrderProgress};
use crate::status::DocumentStatus;

/// Stateless sales-order rollup.
pub struct SalesOrderRollup;

impl SalesOrderRollup {
    /// Adds shipped quantities to the matching sales-order lines.
    ///
    /// # Errors
    ///
    /// Returns `SalesOrderItemNotFound` if a line points outside the order;
    /// the order is left untouched in that case.
    pub fn record_fulfilled(
        order: &mut SalesOrderProgress,
        lines: &[FulfillmentLine],
    ) -> Result<(), FulfillmentError> {
        if let Some(missing) = lines
            .iter()
            .find(|line| order.item(line.sales_order_item_id).is_none())
        {
            return Err(FulfillmentError::SalesOrderItemNotFound(missing.sales_order_item_id));
        }
        for line in lines {
            if let Some(item) = order
                .items
                .iter_mut()
                .find(|item| item.id == line.sales_order_item_id && !item.is_deleted)
            {
                item.fulfilled_quantity += line.quantity;
            }
        }
        Ok(())
    }

    /// Fulfillment status the order should have.
    ///
    /// `finished` when every live line is fully shipped, `active` when anything
    /// was shipped, otherwise the current status.
    #[must_use]
    pub fn status(order: &SalesOrderProgress) -> DocumentStatus {
        if order.status == DocumentStatus::Cancelled {
            return DocumentStatus::Cancelled;
        }
        let mut live = order.items.iter().filter(|item| !item.is_deleted).peekable();
        if live.peek().is_none() {
            return order.status;
        }

        let (mut all_shipped, mut any_shipped) = (true, false);
        for item in live {
            all_shipped &= item.fulfilled_quantity >= item.quantity;
            any_shipped |= item.fulfilled_quantity > 0;
        }

        if all_shipped {
            DocumentStatus::Finished
        } else if any_shipped {
            DocumentStatus::Active
        } else {
            order.status
        }
    }
}
