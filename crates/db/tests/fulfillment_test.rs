//! Integration tests for sales orders and fulfillment approval.

mod common;

use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use stockflow_core::DocumentStatus;
use stockflow_core::fulfillment::{DraftLine, FulfillmentError};
use stockflow_core::stock::StockReference;
use stockflow_db::entities::{fulfillment_items, fulfillments, stock_movements};
use stockflow_db::repositories::fulfillment::CreateSalesOrderItemInput;
use stockflow_db::{FulfillmentRepository, StockRepository};
use stockflow_shared::types::VariantId;

use common::{create_variant, receive, setup_db};

// ===== Test: end-to-end approval =====

#[tokio::test]
async fn test_approval_drains_lots_and_rolls_up_sales_order() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let repo = FulfillmentRepository::new(db.clone());
    let variant = create_variant(&stock, "Office chair").await;
    let lot_a = receive(&stock, variant, 20, dec!(1000)).await;
    let lot_b = receive(&stock, variant, 30, dec!(1000)).await;

    let order = repo
        .create_sales_order(vec![CreateSalesOrderItemInput {
            variant_id: variant,
            quantity: 50,
        }])
        .await
        .expect("sales order should be created");
    let item = &order.items[0];
    let fulfillment = repo
        .create_fulfillment(
            order.id,
            &[DraftLine {
                sales_order_item_id: item.id,
                quantity: 50,
            }],
        )
        .await
        .expect("fulfillment should be drafted");
    assert_eq!(fulfillment.status, DocumentStatus::New);

    let outcome = repo
        .approve_fulfillment(fulfillment.id)
        .await
        .expect("approval should succeed");

    assert_eq!(outcome.status, DocumentStatus::Finished);
    assert_eq!(outcome.total_cost, dec!(50000));
    assert_eq!(outcome.movements.len(), 2);

    let lots = stock.lots_for_variant(variant).await.unwrap();
    assert_eq!(lots[0].id, lot_a.lot.id);
    assert_eq!(lots[0].remaining, 0);
    assert_eq!(lots[1].id, lot_b.lot.id);
    assert_eq!(lots[1].remaining, 0);
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 0);

    let order = repo.find_sales_order(order.id).await.unwrap();
    assert_eq!(order.total_cost, dec!(50000));
    assert_eq!(order.items[0].fulfilled_quantity, 50);
    assert_eq!(order.status, DocumentStatus::Finished);

    let stored = fulfillments::Entity::find_by_id(fulfillment.id.into_inner())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_cost, dec!(50000));
    assert!(stored.approved_at.is_some());
    let items = fulfillment_items::Entity::find().all(&db).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].cost, Some(dec!(50000)));

    let movements = stock
        .movements_for(StockReference::Fulfillment(fulfillment.id))
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
}

#[tokio::test]
async fn test_partial_fulfillment_keeps_order_active() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let repo = FulfillmentRepository::new(db);
    let variant = create_variant(&stock, "Desk").await;
    receive(&stock, variant, 10, dec!(200)).await;

    let order = repo
        .create_sales_order(vec![CreateSalesOrderItemInput {
            variant_id: variant,
            quantity: 6,
        }])
        .await
        .unwrap();
    let item_id = order.items[0].id;
    let first = repo
        .create_fulfillment(
            order.id,
            &[DraftLine {
                sales_order_item_id: item_id,
                quantity: 4,
            }],
        )
        .await
        .unwrap();
    repo.approve_fulfillment(first.id).await.unwrap();

    let order_after = repo.find_sales_order(order.id).await.unwrap();
    assert_eq!(order_after.items[0].fulfilled_quantity, 4);
    assert_eq!(order_after.status, DocumentStatus::Active);
    assert_eq!(order_after.total_cost, dec!(800));

    // only 2 remain outstanding on the line
    let over = repo
        .create_fulfillment(
            order.id,
            &[DraftLine {
                sales_order_item_id: item_id,
                quantity: 3,
            }],
        )
        .await;
    assert!(matches!(over, Err(FulfillmentError::Validation(_))));
}

#[tokio::test]
async fn test_sibling_approvals_accumulate_on_sales_order() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let repo = FulfillmentRepository::new(db);
    let chair = create_variant(&stock, "Chair").await;
    let table = create_variant(&stock, "Table").await;
    receive(&stock, chair, 5, dec!(10)).await;
    receive(&stock, table, 5, dec!(25)).await;

    let order = repo
        .create_sales_order(vec![
            CreateSalesOrderItemInput {
                variant_id: chair,
                quantity: 3,
            },
            CreateSalesOrderItemInput {
                variant_id: table,
                quantity: 4,
            },
        ])
        .await
        .unwrap();
    let chairs = repo
        .create_fulfillment(
            order.id,
            &[DraftLine {
                sales_order_item_id: order.items[0].id,
                quantity: 3,
            }],
        )
        .await
        .unwrap();
    let tables = repo
        .create_fulfillment(
            order.id,
            &[DraftLine {
                sales_order_item_id: order.items[1].id,
                quantity: 4,
            }],
        )
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        repo.approve_fulfillment(chairs.id),
        repo.approve_fulfillment(tables.id)
    );
    assert_eq!(first.unwrap().total_cost, dec!(30));
    assert_eq!(second.unwrap().total_cost, dec!(100));

    let order = repo.find_sales_order(order.id).await.unwrap();
    assert_eq!(order.total_cost, dec!(130));
    assert_eq!(order.items[0].fulfilled_quantity, 3);
    assert_eq!(order.items[1].fulfilled_quantity, 4);
    assert_eq!(order.status, DocumentStatus::Finished);
}

// ===== Test: joint lines overflowing uncommitted stock =====

#[tokio::test]
async fn test_joint_lines_over_headroom_are_rejected_before_any_draw() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let repo = FulfillmentRepository::new(db.clone());
    let variant = create_variant(&stock, "Lamp").await;
    receive(&stock, variant, 10, dec!(15)).await;
    stock.set_committed(variant, 3).await.unwrap();

    let order = repo
        .create_sales_order(vec![
            CreateSalesOrderItemInput {
                variant_id: variant,
                quantity: 5,
            },
            CreateSalesOrderItemInput {
                variant_id: variant,
                quantity: 5,
            },
        ])
        .await
        .unwrap();
    let fulfillment = repo
        .create_fulfillment(
            order.id,
            &[
                DraftLine {
                    sales_order_item_id: order.items[0].id,
                    quantity: 5,
                },
                DraftLine {
                    sales_order_item_id: order.items[1].id,
                    quantity: 5,
                },
            ],
        )
        .await
        .unwrap();
    let movements_before = stock_movements::Entity::find().count(&db).await.unwrap();

    let result = repo.approve_fulfillment(fulfillment.id).await;

    assert!(matches!(
        result,
        Err(FulfillmentError::InsufficientStock { requested: 5, headroom: 2, .. })
    ));
    assert_eq!(
        stock_movements::Entity::find().count(&db).await.unwrap(),
        movements_before
    );
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 10);
    let stored = repo.find_fulfillment(fulfillment.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::New);
    let order = repo.find_sales_order(order.id).await.unwrap();
    assert!(order.items.iter().all(|item| item.fulfilled_quantity == 0));
}

// ===== Test: status guard =====

#[tokio::test]
async fn test_second_approval_is_rejected_without_movements() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let repo = FulfillmentRepository::new(db.clone());
    let variant = create_variant(&stock, "Shelf").await;
    receive(&stock, variant, 10, dec!(40)).await;

    let order = repo
        .create_sales_order(vec![CreateSalesOrderItemInput {
            variant_id: variant,
            quantity: 2,
        }])
        .await
        .unwrap();
    let fulfillment = repo
        .create_fulfillment(
            order.id,
            &[DraftLine {
                sales_order_item_id: order.items[0].id,
                quantity: 2,
            }],
        )
        .await
        .unwrap();
    repo.approve_fulfillment(fulfillment.id).await.unwrap();
    let movements_before = stock_movements::Entity::find().count(&db).await.unwrap();

    let again = repo.approve_fulfillment(fulfillment.id).await;

    assert!(matches!(again, Err(FulfillmentError::AlreadyFinished(id)) if id == fulfillment.id));
    assert_eq!(
        stock_movements::Entity::find().count(&db).await.unwrap(),
        movements_before
    );
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 8);
}

// ===== Test: document validation =====

#[tokio::test]
async fn test_sales_order_validation_collects_every_error() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let repo = FulfillmentRepository::new(db);
    let variant = create_variant(&stock, "Stool").await;

    let result = repo
        .create_sales_order(vec![
            CreateSalesOrderItemInput {
                variant_id: variant,
                quantity: 0,
            },
            CreateSalesOrderItemInput {
                variant_id: VariantId::new(),
                quantity: 1,
            },
        ])
        .await;

    let Err(FulfillmentError::Validation(errors)) = result else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.len(), 2);
    assert!(errors.has_field("items[0].quantity"));
    assert!(errors.has_field("items[1].variant_id"));

    let empty = repo.create_sales_order(Vec::new()).await;
    assert!(matches!(empty, Err(FulfillmentError::Validation(ref e)) if e.has_field("items")));
}

#[tokio::test]
async fn test_missing_documents_are_not_found() {
    let db = setup_db().await;
    let repo = FulfillmentRepository::new(db);

    assert!(matches!(
        repo.approve_fulfillment(stockflow_shared::types::FulfillmentId::new()).await,
        Err(FulfillmentError::NotFound(_))
    ));
    assert!(matches!(
        repo.find_sales_order(stockflow_shared::types::SalesOrderId::new()).await,
        Err(FulfillmentError::SalesOrderNotFound(_))
    ));
}
