//! Shared setup for the repository integration tests.
//!
//! Every test gets its own in-memory SQLite database with the full schema.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use stockflow_core::stock::{StockIn, StockInRequest, StockReference};
use stockflow_db::migration::{Migrator, MigratorTrait};
use stockflow_db::repositories::stock::CreateVariantInput;
use stockflow_db::StockRepository;
use stockflow_shared::types::{DirectPlacementId, VariantId};
use uuid::Uuid;

/// Opens a fresh in-memory database and runs every migration.
pub async fn setup_db() -> DatabaseConnection {
    // a single connection keeps the in-memory database alive for the whole test
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Creates a variant with a unique SKU.
pub async fn create_variant(stock: &StockRepository, name: &str) -> VariantId {
    let variant = stock
        .create_variant(CreateVariantInput {
            sku: format!("SKU-{}", Uuid::new_v4().simple()),
            name: name.to_string(),
        })
        .await
        .expect("Failed to create variant");
    VariantId::from_uuid(variant.id)
}

/// Receives `quantity` units at `unit_cost` into a new lot.
pub async fn receive(
    stock: &StockRepository,
    variant_id: VariantId,
    quantity: i64,
    unit_cost: Decimal,
) -> StockIn {
    stock
        .stock_in(StockInRequest {
            variant_id,
            quantity,
            unit_cost,
            reference: StockReference::DirectPlacement(DirectPlacementId::new()),
        })
        .await
        .expect("Failed to receive stock")
}
