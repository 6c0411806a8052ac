//! Integration tests for the stock ledger repository.
//!
//! Covers FIFO draws, rejected over-requests, reversals, direct placements,
//! stock opname and rebuilding the cached aggregates from the ledger.

#![allow(clippy::uninlined_format_args)]

mod common;

use rust_decimal_macros::dec;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use stockflow_core::stock::{CountAdjustment, MovementDirection, StockError, StockReference};
use stockflow_db::StockRepository;
use stockflow_db::entities::{item_variants, lots, stock_movements};
use stockflow_shared::types::{FulfillmentId, VariantId};

use common::{create_variant, receive, setup_db};

// ===== Test: FIFO draw across three lots =====

#[tokio::test]
async fn test_stock_out_draws_oldest_lots_first() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let variant = create_variant(&stock, "Bolt M8").await;

    let l1 = receive(&stock, variant, 5, dec!(10)).await;
    let l2 = receive(&stock, variant, 20, dec!(12)).await;
    let l3 = receive(&stock, variant, 30, dec!(15)).await;

    let out = stock
        .stock_out(variant, 10, StockReference::Fulfillment(FulfillmentId::new()))
        .await
        .expect("stock out should succeed");

    assert_eq!(out.movements.len(), 2);
    assert_eq!(out.movements[0].lot_id, l1.lot.id);
    assert_eq!(out.movements[0].quantity, 5);
    assert_eq!(out.movements[1].lot_id, l2.lot.id);
    assert_eq!(out.movements[1].quantity, 5);
    assert_eq!(out.cost, dec!(110));

    let remaining: Vec<(_, i64)> = stock
        .lots_for_variant(variant)
        .await
        .unwrap()
        .into_iter()
        .map(|lot| (lot.id, lot.remaining))
        .collect();
    assert_eq!(remaining, vec![(l1.lot.id, 0), (l2.lot.id, 15), (l3.lot.id, 30)]);
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 45);
}

// ===== Test: over-request leaves no trace =====

#[tokio::test]
async fn test_over_request_changes_nothing() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let variant = create_variant(&stock, "Washer").await;
    receive(&stock, variant, 8, dec!(2)).await;
    let movements_before = stock_movements::Entity::find().count(&db).await.unwrap();

    let result = stock
        .stock_out(variant, 9, StockReference::Fulfillment(FulfillmentId::new()))
        .await;

    assert!(matches!(
        result,
        Err(StockError::InsufficientStock { requested: 9, available: 8, .. })
    ));
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 8);
    assert_eq!(
        stock_movements::Entity::find().count(&db).await.unwrap(),
        movements_before
    );
}

#[tokio::test]
async fn test_stock_out_of_unknown_variant_fails() {
    let db = setup_db().await;
    let stock = StockRepository::new(db);

    let result = stock
        .stock_out(VariantId::new(), 1, StockReference::Fulfillment(FulfillmentId::new()))
        .await;

    assert!(matches!(result, Err(StockError::VariantNotFound(_))));
}

// ===== Test: reversal =====

#[tokio::test]
async fn test_reversed_stock_in_nets_to_zero() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let variant = create_variant(&stock, "Hinge").await;
    receive(&stock, variant, 3, dec!(4)).await;
    let received = receive(&stock, variant, 12, dec!(5)).await;
    let reference = received.movement.reference;
    let movements_before = stock_movements::Entity::find().count(&db).await.unwrap();

    stock
        .check_reversal(reference)
        .await
        .expect("fresh stock in should be reversible");
    let reversed = stock.reverse(reference).await.expect("reversal should succeed");

    assert_eq!(reversed.len(), 1);
    assert_eq!(reversed[0].direction, MovementDirection::Out);
    assert_eq!(reversed[0].quantity, 12);
    assert_eq!(reversed[0].reverses_movement_id, Some(received.movement.id));
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 3);
    assert_eq!(
        stock_movements::Entity::find().count(&db).await.unwrap(),
        movements_before + 1
    );
    // ledger grew by the in and its compensating out
    assert_eq!(stock.movements_for(reference).await.unwrap().len(), 2);

    assert!(matches!(
        stock.reverse(reference).await,
        Err(StockError::AlreadyReversed(_))
    ));
}

#[tokio::test]
async fn test_reversal_rejected_after_lot_was_drawn() {
    let db = setup_db().await;
    let stock = StockRepository::new(db);
    let variant = create_variant(&stock, "Spring").await;
    let received = receive(&stock, variant, 10, dec!(1)).await;
    stock
        .stock_out(variant, 1, StockReference::Fulfillment(FulfillmentId::new()))
        .await
        .unwrap();

    let check = stock.check_reversal(received.movement.reference).await;
    let reverse = stock.reverse(received.movement.reference).await;

    assert!(matches!(check, Err(StockError::StockAlreadyConsumed { .. })));
    assert!(matches!(reverse, Err(StockError::StockAlreadyConsumed { .. })));
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 9);
}

#[tokio::test]
async fn test_reversal_check_never_writes() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let variant = create_variant(&stock, "Washer").await;
    let drawn = receive(&stock, variant, 8, dec!(2)).await;
    let untouched = receive(&stock, variant, 5, dec!(2)).await;
    stock
        .stock_out(variant, 3, StockReference::Fulfillment(FulfillmentId::new()))
        .await
        .unwrap();
    let movements_before = stock_movements::Entity::find().count(&db).await.unwrap();

    stock
        .check_reversal(untouched.movement.reference)
        .await
        .expect("untouched stock in should be reversible");
    assert!(matches!(
        stock.check_reversal(drawn.movement.reference).await,
        Err(StockError::StockAlreadyConsumed { lot_id, .. }) if lot_id == drawn.lot.id
    ));
    assert!(matches!(
        stock
            .check_reversal(StockReference::Fulfillment(FulfillmentId::new()))
            .await,
        Err(StockError::MovementsNotFound(_))
    ));

    assert_eq!(
        stock_movements::Entity::find().count(&db).await.unwrap(),
        movements_before
    );
    let remaining: Vec<i64> = stock
        .lots_for_variant(variant)
        .await
        .unwrap()
        .into_iter()
        .map(|lot| lot.remaining)
        .collect();
    assert_eq!(remaining, vec![5, 5]);
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 10);
}

#[tokio::test]
async fn test_reversing_a_stock_out_restores_lots() {
    let db = setup_db().await;
    let stock = StockRepository::new(db);
    let variant = create_variant(&stock, "Gasket").await;
    receive(&stock, variant, 4, dec!(3)).await;
    receive(&stock, variant, 6, dec!(3)).await;
    let reference = StockReference::Fulfillment(FulfillmentId::new());
    stock.stock_out(variant, 7, reference).await.unwrap();

    let reversed = stock.reverse(reference).await.unwrap();

    assert_eq!(reversed.len(), 2);
    assert!(reversed.iter().all(|m| m.direction == MovementDirection::In));
    let remaining: Vec<i64> = stock
        .lots_for_variant(variant)
        .await
        .unwrap()
        .into_iter()
        .map(|lot| lot.remaining)
        .collect();
    assert_eq!(remaining, vec![4, 6]);
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 10);
}

// ===== Test: direct placement and stock opname =====

#[tokio::test]
async fn test_direct_placement_creates_lot_and_can_be_reversed() {
    let db = setup_db().await;
    let stock = StockRepository::new(db);
    let variant = create_variant(&stock, "Panel").await;

    let record = stock
        .record_direct_placement(variant, 7, dec!(30), Some("initial stock".to_string()))
        .await
        .expect("placement should succeed");

    assert_eq!(record.placement.quantity, 7);
    assert_eq!(record.stock.lot.remaining, 7);
    assert_eq!(record.stock.lot.unit_cost, dec!(30));
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 7);

    stock.reverse(record.stock.movement.reference).await.unwrap();
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 0);
}

#[tokio::test]
async fn test_stockopname_moves_stock_to_count() {
    let db = setup_db().await;
    let stock = StockRepository::new(db);
    let variant = create_variant(&stock, "Cable").await;
    receive(&stock, variant, 10, dec!(2)).await;

    let shortage = stock
        .record_stockopname(variant, 6, dec!(2), None)
        .await
        .unwrap();
    assert_eq!(shortage.stockopname.recorded_quantity, 10);
    assert_eq!(shortage.stockopname.counted_quantity, 6);
    assert!(matches!(
        shortage.adjustment,
        CountAdjustment::Shortage(ref out) if out.cost == dec!(8)
    ));
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 6);

    let surplus = stock
        .record_stockopname(variant, 9, dec!(3), Some("found a box".to_string()))
        .await
        .unwrap();
    assert!(matches!(surplus.adjustment, CountAdjustment::Surplus(ref s) if s.lot.remaining == 3));
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 9);

    let unchanged = stock
        .record_stockopname(variant, 9, dec!(3), None)
        .await
        .unwrap();
    assert_eq!(unchanged.adjustment, CountAdjustment::Unchanged);
}

// ===== Test: committed stock =====

#[tokio::test]
async fn test_set_committed_validates_input() {
    let db = setup_db().await;
    let stock = StockRepository::new(db);
    let variant = create_variant(&stock, "Clamp").await;

    stock.set_committed(variant, 4).await.unwrap();
    assert_eq!(stock.variant_stock(variant).await.unwrap().committed, 4);

    assert!(matches!(
        stock.set_committed(variant, -1).await,
        Err(StockError::InvalidQuantity(-1))
    ));
    assert!(matches!(
        stock.set_committed(VariantId::new(), 1).await,
        Err(StockError::VariantNotFound(_))
    ));
}

// ===== Test: rebuilding aggregates =====

#[tokio::test]
async fn test_rebuild_restores_drifted_caches() {
    let db = setup_db().await;
    let stock = StockRepository::new(db.clone());
    let variant = create_variant(&stock, "Rivet").await;
    let empty = create_variant(&stock, "Unused").await;
    let first = receive(&stock, variant, 5, dec!(1)).await;
    receive(&stock, variant, 20, dec!(1)).await;
    stock
        .stock_out(variant, 8, StockReference::Fulfillment(FulfillmentId::new()))
        .await
        .unwrap();

    item_variants::Entity::update_many()
        .col_expr(item_variants::Column::AvailableStock, Expr::value(999_i64))
        .exec(&db)
        .await
        .unwrap();
    lots::Entity::update_many()
        .col_expr(lots::Column::Remaining, Expr::value(42_i64))
        .filter(lots::Column::Id.eq(first.lot.id.into_inner()))
        .exec(&db)
        .await
        .unwrap();

    let replay = stock.rebuild_aggregates(None).await.expect("rebuild should succeed");

    assert_eq!(replay.variant_available.get(&variant), Some(&17));
    assert_eq!(replay.variant_available.get(&empty), Some(&0));
    assert_eq!(replay.lot_remaining.get(&first.lot.id), Some(&0));
    assert_eq!(stock.variant_stock(variant).await.unwrap().available, 17);
    assert_eq!(stock.variant_stock(empty).await.unwrap().available, 0);
    let lots = stock.lots_for_variant(variant).await.unwrap();
    assert_eq!(lots[0].remaining, 0);
    assert_eq!(lots[1].remaining, 17);
}

#[tokio::test]
async fn test_rebuild_of_unknown_variant_fails() {
    let db = setup_db().await;
    let stock = StockRepository::new(db);

    assert!(matches!(
        stock.rebuild_aggregates(Some(VariantId::new())).await,
        Err(StockError::VariantNotFound(_))
    ));
}
