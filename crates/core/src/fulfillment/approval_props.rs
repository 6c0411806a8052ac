//! Property-based tests for fulfillment approval.
//!
//! - Approval succeeds iff Σ line quantities per variant fits available − committed
//! - A rejected approval leaves the working set untouched
//! - An accepted approval draws exactly the requested quantity and costs it

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use stockflow_shared::types::{
    FulfillmentId, FulfillmentItemId, ReceivingId, SalesOrderId, SalesOrderItemId, VariantId,
};

use super::approval::FulfillmentApproval;
use super::error::FulfillmentError;
use super::types::{Fulfillment, FulfillmentLine, SalesOrderLine, SalesOrderProgress};
use crate::status::DocumentStatus;
use crate::stock::{StockBook, StockInRequest, StockReference, VariantStock};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* lot sizes, committed quantity and line quantities on one
    /// variant, approval SHALL succeed exactly when the lines fit together.
    #[test]
    fn prop_approval_matches_joint_headroom(
        lots in prop::collection::vec(1i64..40, 1..5),
        committed in 0i64..30,
        quantities in prop::collection::vec(1i64..25, 1..5),
        unit_cost in 1i64..500,
    ) {
        let at = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
        let variant = VariantId::new();
        let mut book = StockBook::new();
        book.track_variant(VariantStock {
            variant_id: variant,
            available: 0,
            committed,
        });
        for quantity in &lots {
            let request = StockInRequest {
                variant_id: variant,
                quantity: *quantity,
                unit_cost: Decimal::from(unit_cost),
                reference: StockReference::Receiving(ReceivingId::new()),
            };
            book.stock_in(request, at).unwrap();
        }
        book.take_changes();

        let item_id = SalesOrderItemId::new();
        let requested: i64 = quantities.iter().sum();
        let order = SalesOrderProgress {
            id: SalesOrderId::new(),
            status: DocumentStatus::New,
            total_cost: Decimal::ZERO,
            items: vec![SalesOrderLine {
                id: item_id,
                variant_id: variant,
                quantity: requested,
                fulfilled_quantity: 0,
                is_deleted: false,
            }],
        };
        let fulfillment = Fulfillment {
            id: FulfillmentId::new(),
            sales_order_id: order.id,
            status: DocumentStatus::New,
            lines: quantities
                .iter()
                .map(|q| FulfillmentLine {
                    id: FulfillmentItemId::new(),
                    sales_order_item_id: item_id,
                    variant_id: variant,
                    quantity: *q,
                })
                .collect(),
        };

        let available: i64 = lots.iter().sum();
        let fits = requested <= available - committed;

        match FulfillmentApproval::approve(&fulfillment, &order, &mut book, at) {
            Ok(outcome) => {
                prop_assert!(fits);
                let drawn: i64 = outcome.movements.iter().map(|m| m.quantity).sum();
                prop_assert_eq!(drawn, requested);
                prop_assert_eq!(outcome.total_cost, Decimal::from(requested * unit_cost));
                prop_assert_eq!(book.available(variant), available - requested);
                prop_assert_eq!(outcome.sales_order.status, DocumentStatus::Finished);
            }
            Err(FulfillmentError::InsufficientStock { .. }) => {
                prop_assert!(!fits);
                prop_assert!(!book.has_changes());
                prop_assert_eq!(book.available(variant), available);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }
}
