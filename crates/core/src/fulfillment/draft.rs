//! Drafting a new fulfillment.

use std::collections::BTreeMap;

use stockflow_shared::types::{FulfillmentId, FulfillmentItemId};

use crate::fulfillment::error::FulfillmentError;
use crate::fulfillment::types::{DraftLine, Fulfillment, FulfillmentLine, SalesOrderProgress};
use crate::status::DocumentStatus;
use crate::validation::{LineRequest, Outstanding, validate_lines};

/// Stateless fulfillment drafting.
pub struct FulfillmentDraft;

impl FulfillmentDraft {
    /// Validates requested lines against a sales order and builds a `new` fulfillment.
    ///
    /// Every line must ship a positive quantity of a live line of the order, and
    /// the quantities requested per order line must stay within its outstanding
    /// quantity (ordered − fulfilled).
    ///
    /// # Errors
    ///
    /// Returns `Validation` carrying every failed check.
    pub fn create(
        order: &SalesOrderProgress,
        lines: &[DraftLine],
    ) -> Result<Fulfillment, FulfillmentError> {
        let outstanding: BTreeMap<_, _> = order
            .items
            .iter()
            .filter(|item| !item.is_deleted)
            .map(|item| {
                (
                    item.id,
                    Outstanding {
                        ordered: item.quantity,
                        consumed: item.fulfilled_quantity,
                    },
                )
            })
            .collect();

        let requests: Vec<LineRequest<_>> = lines
            .iter()
            .map(|line| LineRequest {
                key: line.sales_order_item_id,
                quantity: line.quantity,
            })
            .collect();
        validate_lines(&requests, &outstanding, "sales_order_item_id")?;

        let lines = lines
            .iter()
            .map(|line| {
                let item = order
                    .item(line.sales_order_item_id)
                    .ok_or(FulfillmentError::SalesOrderItemNotFound(line.sales_order_item_id))?;
                Ok(FulfillmentLine {
                    id: FulfillmentItemId::new(),
                    sales_order_item_id: item.id,
                    variant_id: item.variant_id,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>, FulfillmentError>>()?;

        Ok(Fulfillment {
            id: FulfillmentId::new(),
            sales_order_id: order.id,
            status: DocumentStatus::New,
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::types::SalesOrderLine;
    use rust_decimal::Decimal;
    use stockflow_shared::types::{SalesOrderId, SalesOrderItemId, VariantId};

    fn order() -> SalesOrderProgress {
        SalesOrderProgress {
            id: SalesOrderId::new(),
            status: DocumentStatus::New,
            total_cost: Decimal::ZERO,
            items: vec![
                SalesOrderLine {
                    id: SalesOrderItemId::new(),
                    variant_id: VariantId::new(),
                    quantity: 10,
                    fulfilled_quantity: 6,
                    is_deleted: false,
                },
                SalesOrderLine {
                    id: SalesOrderItemId::new(),
                    variant_id: VariantId::new(),
                    quantity: 3,
                    fulfilled_quantity: 0,
                    is_deleted: true,
                },
            ],
        }
    }

    #[test]
    fn test_create_resolves_variants() {
        let order = order();
        let item = &order.items[0];
        let fulfillment = FulfillmentDraft::create(&order, &[DraftLine {
            sales_order_item_id: item.id,
            quantity: 4,
        }])
        .unwrap();

        assert_eq!(fulfillment.status, DocumentStatus::New);
        assert_eq!(fulfillment.sales_order_id, order.id);
        assert_eq!(fulfillment.lines[0].variant_id, item.variant_id);
        assert_eq!(fulfillment.lines[0].quantity, 4);
    }

    #[test]
    fn test_create_collects_independent_failures() {
        let order = order();
        let live = order.items[0].id;
        let deleted = order.items[1].id;

        let err = FulfillmentDraft::create(&order, &[
            DraftLine {
                sales_order_item_id: live,
                quantity: 5,
            },
            DraftLine {
                sales_order_item_id: deleted,
                quantity: 1,
            },
            DraftLine {
                sales_order_item_id: live,
                quantity: -1,
            },
        ])
        .unwrap_err();

        let FulfillmentError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors.has_field("lines[0].quantity"));
        assert!(errors.has_field("lines[1].sales_order_item_id"));
        assert!(errors.has_field("lines[2].quantity"));
    }

    #[test]
    fn test_create_requires_lines() {
        let err = FulfillmentDraft::create(&order(), &[]).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }
}
