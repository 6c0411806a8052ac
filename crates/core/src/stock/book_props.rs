//! Property-based tests for the stock book.
//!
//! - Lot remaining always equals Σ in − Σ out and never goes negative
//! - Variant available always equals Σ remaining of its lots
//! - A failed stock-out records nothing
//! - Reversing a fulfillment restores the variant's available quantity

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use stockflow_shared::types::{FulfillmentId, ReceivingId, VariantId};

use super::aggregate::StockAggregator;
use super::book::StockBook;
use super::error::StockError;
use super::reversal::ReversalEngine;
use super::types::{StockInRequest, StockReference, VariantStock};

/// A single step against the book.
#[derive(Debug, Clone)]
enum Step {
    In { quantity: i64, cost_cents: i64 },
    Out { quantity: i64 },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1i64..50, 0i64..10_000)
            .prop_map(|(quantity, cost_cents)| Step::In { quantity, cost_cents }),
        (1i64..60).prop_map(|quantity| Step::Out { quantity }),
    ]
}

fn at(step: usize) -> DateTime<Utc> {
    let minutes = i64::try_from(step).unwrap_or(i64::MAX / 60_000);
    Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn assert_consistent(book: &StockBook, variant: VariantId) -> Result<(), TestCaseError> {
    let mut total = 0;
    for lot in book.lots_of(variant) {
        let history = book.movements_of(lot.id);
        prop_assert_eq!(lot.remaining, StockAggregator::lot_remaining(history));
        prop_assert!(lot.remaining >= 0);
        let mut running = 0;
        for movement in history {
            running += movement.signed_quantity();
            prop_assert_eq!(movement.remaining_after, running);
        }
        total += lot.remaining;
    }
    prop_assert_eq!(book.available(variant), total);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* sequence of stock-ins and stock-outs the lot and variant
    /// caches SHALL match the movement history.
    #[test]
    fn prop_caches_match_history(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let variant = VariantId::new();
        let mut book = StockBook::new();
        book.track_variant(VariantStock::empty(variant));

        for (i, step) in steps.iter().enumerate() {
            match step {
                Step::In { quantity, cost_cents } => {
                    let request = StockInRequest {
                        variant_id: variant,
                        quantity: *quantity,
                        unit_cost: Decimal::new(*cost_cents, 2),
                        reference: StockReference::Receiving(ReceivingId::new()),
                    };
                    prop_assert!(book.stock_in(request, at(i)).is_ok());
                }
                Step::Out { quantity } => {
                    let before = book.available(variant);
                    let reference = StockReference::Fulfillment(FulfillmentId::new());
                    match book.stock_out(variant, *quantity, reference, at(i)) {
                        Ok(out) => {
                            let drawn: i64 = out.movements.iter().map(|m| m.quantity).sum();
                            prop_assert_eq!(drawn, *quantity);
                            prop_assert_eq!(book.available(variant), before - quantity);
                        }
                        Err(StockError::InsufficientStock { available, .. }) => {
                            prop_assert!(before < *quantity);
                            prop_assert_eq!(available, before);
                            prop_assert_eq!(book.available(variant), before);
                            prop_assert!(book.movements_for(reference).is_empty());
                        }
                        Err(other) => prop_assert!(false, "unexpected error {other}"),
                    }
                }
            }
            assert_consistent(&book, variant)?;
        }
    }

    /// *For any* successful fulfillment, reversing it SHALL restore the
    /// available quantity it consumed.
    #[test]
    fn prop_fulfillment_reversal_restores_available(
        lots in prop::collection::vec(1i64..30, 1..6),
        draw_ratio in 1u32..=100,
    ) {
        let variant = VariantId::new();
        let mut book = StockBook::new();
        book.track_variant(VariantStock::empty(variant));
        for (i, quantity) in lots.iter().enumerate() {
            let request = StockInRequest {
                variant_id: variant,
                quantity: *quantity,
                unit_cost: Decimal::ONE,
                reference: StockReference::Receiving(ReceivingId::new()),
            };
            book.stock_in(request, at(i)).unwrap();
        }

        let total = book.available(variant);
        let draw = (total * i64::from(draw_ratio) / 100).max(1);
        let fulfillment = StockReference::Fulfillment(FulfillmentId::new());
        let out = book.stock_out(variant, draw, fulfillment, at(100)).unwrap();
        prop_assert_eq!(out.cost, Decimal::from(draw));

        ReversalEngine::reverse(&mut book, fulfillment, at(101)).unwrap();

        prop_assert_eq!(book.available(variant), total);
        assert_consistent(&book, variant)?;
    }
}
