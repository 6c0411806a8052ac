//! Property-based tests for the purchase-order rollup.
//!
//! - Rolling up twice yields identical statuses and totals
//! - Σ paid never counts uncleared or deleted expenses

use proptest::prelude::*;
use rust_decimal::Decimal;

use stockflow_shared::types::{
    FinanceExpenseId, PartnerId, PurchaseInvoiceId, PurchaseOrderId, PurchaseOrderItemId,
    ReceivingId, ReceivingItemId, VariantId,
};

use super::rollup::PurchaseStatusRollup;
use super::types::{
    ExpenseSnapshot, InvoiceSnapshot, PurchaseOrderLine, PurchaseOrderSnapshot, ReceivingLine,
    ReceivingSnapshot,
};
use crate::status::{DocumentStatus, ExpenseStatus};

fn status_strategy() -> impl Strategy<Value = DocumentStatus> {
    prop_oneof![
        Just(DocumentStatus::New),
        Just(DocumentStatus::Active),
        Just(DocumentStatus::Finished),
    ]
}

/// (amount, cleared, deleted)
fn expense_strategy() -> impl Strategy<Value = (i64, bool, bool)> {
    (1i64..500, any::<bool>(), prop::bool::weighted(0.2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* order state, applying the rollup and rolling up again SHALL
    /// change nothing.
    #[test]
    fn prop_rollup_idempotent(
        statuses in (status_strategy(), status_strategy(), status_strategy()),
        ordered in prop::collection::vec(1i64..20, 1..4),
        received in prop::collection::vec((1i64..20, any::<bool>()), 0..4),
        invoices in prop::collection::vec(
            (1i64..1000, status_strategy(), prop::collection::vec(expense_strategy(), 0..4)),
            0..3,
        ),
        charge in 0i64..2000,
    ) {
        let lines: Vec<PurchaseOrderLine> = ordered
            .iter()
            .map(|q| PurchaseOrderLine {
                id: PurchaseOrderItemId::new(),
                variant_id: VariantId::new(),
                quantity: *q,
                unit_price: Decimal::ONE,
            })
            .collect();
        let mut order = PurchaseOrderSnapshot {
            id: PurchaseOrderId::new(),
            supplier_id: PartnerId::new(),
            status: statuses.0,
            invoice_status: statuses.1,
            receiving_status: statuses.2,
            total_charge: Decimal::from(charge),
            total_paid: Decimal::ZERO,
            lines,
        };
        let receivings: Vec<ReceivingSnapshot> = received
            .iter()
            .map(|(q, deleted)| ReceivingSnapshot {
                id: ReceivingId::new(),
                is_deleted: *deleted,
                lines: vec![ReceivingLine {
                    id: ReceivingItemId::new(),
                    purchase_order_item_id: order.lines[0].id,
                    variant_id: order.lines[0].variant_id,
                    quantity: *q,
                    unit_cost: Decimal::ONE,
                }],
            })
            .collect();
        let mut invoices: Vec<InvoiceSnapshot> = invoices
            .iter()
            .map(|(total, status, expenses)| InvoiceSnapshot {
                id: PurchaseInvoiceId::new(),
                total_amount: Decimal::from(*total),
                total_paid: Decimal::ZERO,
                status: *status,
                is_deleted: false,
                expenses: expenses
                    .iter()
                    .map(|(amount, cleared, deleted)| ExpenseSnapshot {
                        id: FinanceExpenseId::new(),
                        amount: Decimal::from(*amount),
                        status: if *cleared { ExpenseStatus::Cleared } else { ExpenseStatus::New },
                        is_deleted: *deleted,
                    })
                    .collect(),
            })
            .collect();

        let first = PurchaseStatusRollup::rollup(&order, &invoices, &receivings).unwrap();

        let expected_paid: Decimal = invoices
            .iter()
            .flat_map(|i| &i.expenses)
            .filter(|e| !e.is_deleted && e.status == ExpenseStatus::Cleared)
            .map(|e| e.amount)
            .sum();
        prop_assert_eq!(first.total_paid, expected_paid);

        PurchaseStatusRollup::apply(&first, &mut order, &mut invoices);
        let second = PurchaseStatusRollup::rollup(&order, &invoices, &receivings).unwrap();
        prop_assert_eq!(first, second);
    }
}
