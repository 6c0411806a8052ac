//! Integration tests for purchase orders: receiving, invoicing, status
//! rollup and cancellation.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use stockflow_core::DocumentStatus;
use stockflow_core::purchasing::{PurchaseError, PurchaseOrderSnapshot, ReceivingDraftLine};
use stockflow_core::stock::StockReference;
use stockflow_db::entities::{finance_expenses, purchase_invoices, purchase_orders, receivings};
use stockflow_db::repositories::purchase::{
    CreatePurchaseOrderInput, CreatePurchaseOrderItemInput,
};
use stockflow_db::{PurchaseRepository, StockRepository};
use stockflow_shared::types::{FulfillmentId, PartnerId, PurchaseOrderId, VariantId};

use common::{create_variant, setup_db};

struct Fixture {
    db: DatabaseConnection,
    stock: StockRepository,
    purchases: PurchaseRepository,
    supplier: PartnerId,
    variant: VariantId,
    order: PurchaseOrderSnapshot,
}

/// One supplier and one order of 10 units at 5 each.
async fn order_fixture() -> Fixture {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let purchases = PurchaseRepository::new(db.clone());
    let variant = create_variant(&stock, "Steel sheet").await;
    let supplier = purchases
        .create_partner("Acme Metals")
        .await
        .expect("partner should be created");
    let supplier = PartnerId::from_uuid(supplier.id);

    let order = purchases
        .create_purchase_order(CreatePurchaseOrderInput {
            supplier_id: supplier,
            items: vec![CreatePurchaseOrderItemInput {
                variant_id: variant,
                quantity: 10,
                unit_price: dec!(5),
            }],
        })
        .await
        .expect("purchase order should be created");

    Fixture {
        db,
        stock,
        purchases,
        supplier,
        variant,
        order,
    }
}

async fn receive_all(fx: &Fixture, quantity: i64) {
    fx.purchases
        .record_receiving(
            fx.order.id,
            &[ReceivingDraftLine {
                purchase_order_item_id: fx.order.lines[0].id,
                quantity,
            }],
        )
        .await
        .expect("receiving should succeed");
}

async fn partner_totals(fx: &Fixture) -> (Decimal, Decimal) {
    let partner = fx.purchases.find_partner(fx.supplier).await.unwrap();
    (partner.total_expenditure, partner.total_credit)
}

// ===== Test: order creation =====

#[tokio::test]
async fn test_create_order_books_expenditure() {
    let fx = order_fixture().await;

    assert_eq!(fx.order.total_charge, dec!(50));
    assert_eq!(fx.order.status, DocumentStatus::New);
    assert_eq!(fx.order.invoice_status, DocumentStatus::New);
    assert_eq!(fx.order.receiving_status, DocumentStatus::New);
    assert_eq!(partner_totals(&fx).await, (dec!(50), dec!(0)));

    let stored = fx.purchases.find_purchase_order(fx.order.id).await.unwrap();
    assert_eq!(stored, fx.order);
}

#[tokio::test]
async fn test_create_order_validation() {
    let fx = order_fixture().await;

    let unknown_supplier = fx
        .purchases
        .create_purchase_order(CreatePurchaseOrderInput {
            supplier_id: PartnerId::new(),
            items: vec![CreatePurchaseOrderItemInput {
                variant_id: fx.variant,
                quantity: 1,
                unit_price: dec!(1),
            }],
        })
        .await;
    assert!(matches!(unknown_supplier, Err(PurchaseError::PartnerNotFound(_))));

    let bad_items = fx
        .purchases
        .create_purchase_order(CreatePurchaseOrderInput {
            supplier_id: fx.supplier,
            items: vec![CreatePurchaseOrderItemInput {
                variant_id: VariantId::new(),
                quantity: -2,
                unit_price: dec!(-1),
            }],
        })
        .await;
    let Err(PurchaseError::Validation(errors)) = bad_items else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.len(), 3);
    assert!(errors.has_field("items[0].quantity"));
    assert!(errors.has_field("items[0].unit_price"));
    assert!(errors.has_field("items[0].variant_id"));
}

#[tokio::test]
async fn test_create_order_rejects_unpriceable_total() {
    let fx = order_fixture().await;

    let result = fx
        .purchases
        .create_purchase_order(CreatePurchaseOrderInput {
            supplier_id: fx.supplier,
            items: vec![CreatePurchaseOrderItemInput {
                variant_id: fx.variant,
                quantity: 2,
                unit_price: Decimal::MAX,
            }],
        })
        .await;

    let Err(PurchaseError::Validation(errors)) = result else {
        panic!("expected validation errors");
    };
    assert!(errors.has_field("items"));
    assert_eq!(purchase_orders::Entity::find().count(&fx.db).await.unwrap(), 1);
    assert_eq!(partner_totals(&fx).await, (dec!(50), dec!(0)));
}

// ===== Test: receiving =====

#[tokio::test]
async fn test_receiving_creates_lots_at_order_price() {
    let fx = order_fixture().await;

    let outcome = fx
        .purchases
        .record_receiving(
            fx.order.id,
            &[ReceivingDraftLine {
                purchase_order_item_id: fx.order.lines[0].id,
                quantity: 4,
            }],
        )
        .await
        .unwrap();

    assert_eq!(outcome.receiving_status, DocumentStatus::Active);
    assert_eq!(outcome.status, DocumentStatus::Active);
    assert_eq!(outcome.stock.len(), 1);
    assert_eq!(outcome.stock[0].lot.unit_cost, dec!(5));
    assert_eq!(fx.stock.variant_stock(fx.variant).await.unwrap().available, 4);

    receive_all(&fx, 6).await;
    let order = fx.purchases.find_purchase_order(fx.order.id).await.unwrap();
    assert_eq!(order.receiving_status, DocumentStatus::Finished);
    assert_eq!(fx.stock.variant_stock(fx.variant).await.unwrap().available, 10);

    let over = fx
        .purchases
        .record_receiving(
            fx.order.id,
            &[ReceivingDraftLine {
                purchase_order_item_id: fx.order.lines[0].id,
                quantity: 1,
            }],
        )
        .await;
    assert!(matches!(over, Err(PurchaseError::Validation(_))));
    assert_eq!(fx.purchases.receivings_for(fx.order.id).await.unwrap().len(), 2);
}

// ===== Test: invoices, expenses and supplier credit =====

#[tokio::test]
async fn test_invoice_payment_flow_finishes_order() {
    let fx = order_fixture().await;
    receive_all(&fx, 10).await;

    let invoice = fx
        .purchases
        .register_invoice(fx.order.id, dec!(50))
        .await
        .unwrap();
    assert_eq!(partner_totals(&fx).await, (dec!(50), dec!(50)));
    let order = fx.purchases.find_purchase_order(fx.order.id).await.unwrap();
    assert_eq!(order.invoice_status, DocumentStatus::Active);

    let first = fx.purchases.record_expense(invoice.id, dec!(20)).await.unwrap();
    let second = fx.purchases.record_expense(invoice.id, dec!(30)).await.unwrap();
    let too_much = fx.purchases.record_expense(invoice.id, dec!(1)).await;
    assert!(matches!(too_much, Err(PurchaseError::Validation(_))));

    let partial = fx.purchases.clear_expense(first.id).await.unwrap();
    assert_eq!(partial.total_paid, dec!(20));
    assert_eq!(partial.invoice_status, DocumentStatus::Active);
    assert_eq!(partner_totals(&fx).await, (dec!(50), dec!(30)));

    let settled = fx.purchases.clear_expense(second.id).await.unwrap();
    assert_eq!(settled.total_paid, dec!(50));
    assert_eq!(settled.invoice_status, DocumentStatus::Finished);
    assert_eq!(settled.receiving_status, DocumentStatus::Finished);
    assert_eq!(settled.status, DocumentStatus::Finished);
    assert_eq!(partner_totals(&fx).await, (dec!(50), dec!(0)));

    let invoices = fx.purchases.invoices_for(fx.order.id).await.unwrap();
    assert_eq!(invoices[0].total_paid, dec!(50));
    assert_eq!(invoices[0].status, DocumentStatus::Finished);

    assert!(matches!(
        fx.purchases.clear_expense(first.id).await,
        Err(PurchaseError::ExpenseAlreadyCleared(_))
    ));
}

#[tokio::test]
async fn test_only_first_invoice_books_credit() {
    let fx = order_fixture().await;

    fx.purchases.register_invoice(fx.order.id, dec!(20)).await.unwrap();
    fx.purchases.register_invoice(fx.order.id, dec!(30)).await.unwrap();

    assert_eq!(partner_totals(&fx).await, (dec!(50), dec!(50)));
    let over = fx.purchases.register_invoice(fx.order.id, dec!(1)).await;
    assert!(matches!(over, Err(PurchaseError::Validation(_))));
}

// ===== Test: rollup idempotence =====

#[tokio::test]
async fn test_refresh_twice_yields_identical_statuses() {
    let fx = order_fixture().await;
    receive_all(&fx, 10).await;
    let invoice = fx.purchases.register_invoice(fx.order.id, dec!(50)).await.unwrap();
    let expense = fx.purchases.record_expense(invoice.id, dec!(50)).await.unwrap();
    fx.purchases.clear_expense(expense.id).await.unwrap();

    let first = fx.purchases.refresh_statuses(fx.order.id).await.unwrap();
    let order_after_first = fx.purchases.find_purchase_order(fx.order.id).await.unwrap();
    let second = fx.purchases.refresh_statuses(fx.order.id).await.unwrap();
    let order_after_second = fx.purchases.find_purchase_order(fx.order.id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(order_after_first, order_after_second);
    assert_eq!(second.status, DocumentStatus::Finished);
}

// ===== Test: cancellation =====

#[tokio::test]
async fn test_cancel_after_sale_is_rejected_and_changes_nothing() {
    let fx = order_fixture().await;
    receive_all(&fx, 10).await;
    fx.stock
        .stock_out(fx.variant, 3, StockReference::Fulfillment(FulfillmentId::new()))
        .await
        .unwrap();
    let before = fx.purchases.find_purchase_order(fx.order.id).await.unwrap();

    let result = fx.purchases.cancel_purchase_order(fx.order.id, "supplier recall").await;

    assert!(matches!(result, Err(PurchaseError::ItemAlreadySold { .. })));
    let after = fx.purchases.find_purchase_order(fx.order.id).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(fx.stock.variant_stock(fx.variant).await.unwrap().available, 7);
    assert_eq!(partner_totals(&fx).await, (dec!(50), dec!(0)));
}

#[tokio::test]
async fn test_cancel_reverses_stock_and_cascades() {
    let fx = order_fixture().await;
    receive_all(&fx, 10).await;
    let invoice = fx.purchases.register_invoice(fx.order.id, dec!(50)).await.unwrap();
    let expense = fx.purchases.record_expense(invoice.id, dec!(20)).await.unwrap();
    fx.purchases.clear_expense(expense.id).await.unwrap();
    assert_eq!(partner_totals(&fx).await, (dec!(50), dec!(30)));

    let plan = fx
        .purchases
        .cancel_purchase_order(fx.order.id, "  wrong supplier  ")
        .await
        .expect("cancellation should succeed");

    assert_eq!(plan.note, "wrong supplier");
    assert_eq!(plan.movements.len(), 1);
    assert_eq!(plan.expenditure_reduction, dec!(50));
    assert_eq!(plan.credit_reduction, dec!(30));
    assert_eq!(plan.deleted_receivings.len(), 1);
    assert_eq!(plan.deleted_invoices, vec![invoice.id]);
    assert_eq!(plan.deleted_expenses, vec![expense.id]);

    assert_eq!(fx.stock.variant_stock(fx.variant).await.unwrap().available, 0);
    assert_eq!(partner_totals(&fx).await, (dec!(0), dec!(0)));

    let cancelled = fx.purchases.find_purchase_order(fx.order.id).await.unwrap();
    assert_eq!(cancelled.status, DocumentStatus::Cancelled);
    let db = &fx.db;
    let stored = purchase_orders::Entity::find_by_id(fx.order.id.into_inner())
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.cancellation_note.as_deref(), Some("wrong supplier"));
    assert_eq!(
        receivings::Entity::find()
            .filter(receivings::Column::IsDeleted.eq(true))
            .count(db)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        purchase_invoices::Entity::find()
            .filter(purchase_invoices::Column::IsDeleted.eq(true))
            .count(db)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        finance_expenses::Entity::find()
            .filter(finance_expenses::Column::IsDeleted.eq(true))
            .count(db)
            .await
            .unwrap(),
        1
    );

    assert!(matches!(
        fx.purchases.cancel_purchase_order(fx.order.id, "again").await,
        Err(PurchaseError::AlreadyCancelled(_))
    ));
    assert!(matches!(
        fx.purchases.refresh_statuses(fx.order.id).await,
        Err(PurchaseError::AlreadyCancelled(_))
    ));
}

#[tokio::test]
async fn test_cancel_requires_note_and_live_order() {
    let fx = order_fixture().await;

    assert!(matches!(
        fx.purchases.cancel_purchase_order(fx.order.id, "   ").await,
        Err(PurchaseError::Validation(ref e)) if e.has_field("note")
    ));
    assert!(matches!(
        fx.purchases
            .cancel_purchase_order(PurchaseOrderId::new(), "missing")
            .await,
        Err(PurchaseError::NotFound(_))
    ));

    // nothing received or invoiced: only the expenditure is taken back
    let plan = fx.purchases.cancel_purchase_order(fx.order.id, "not needed").await.unwrap();
    assert!(plan.movements.is_empty());
    assert_eq!(plan.credit_reduction, dec!(0));
    assert_eq!(partner_totals(&fx).await, (dec!(0), dec!(0)));
}
