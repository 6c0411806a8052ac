//! Database seeder for Stockflow development and testing.
//!
//! Seeds a handful of item variants with opening stock, a supplier with a
//! received purchase order and a sales order with an approved fulfillment,
//! so every table has realistic rows to look at.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use sea_orm_migration::MigratorTrait;
use stockflow_core::fulfillment::DraftLine;
use stockflow_core::purchasing::ReceivingDraftLine;
use stockflow_db::entities::item_variants;
use stockflow_db::migration::Migrator;
use stockflow_db::repositories::{
    CreatePurchaseOrderInput, CreatePurchaseOrderItemInput, CreateSalesOrderItemInput,
    CreateVariantInput,
};
use stockflow_db::{FulfillmentRepository, PurchaseRepository, StockRepository};
use stockflow_shared::types::{PartnerId, VariantId};
use stockflow_shared::{AppConfig, telemetry};
use tracing::info;

/// SKU, name, opening quantity and unit cost of the seeded variants.
const VARIANTS: [(&str, &str, i64, i64); 3] = [
    ("CHAIR-OAK", "Oak chair", 20, 1000),
    ("DESK-PINE", "Pine desk", 8, 4500),
    ("LAMP-BRASS", "Brass lamp", 0, 0),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init_tracing(&config.logging).context("failed to initialise tracing")?;

    let db = stockflow_db::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("failed to run migrations")?;

    if item_variants::Entity::find().count(&db).await? > 0 {
        info!("database already seeded, skipping");
        return Ok(());
    }

    let variants = seed_variants(&db).await?;
    seed_purchasing(&db, &variants).await?;
    seed_sales(&db, &variants).await?;

    info!("seeding complete");
    Ok(())
}

/// Creates the variants and places their opening stock.
async fn seed_variants(db: &DatabaseConnection) -> anyhow::Result<Vec<VariantId>> {
    let stock = StockRepository::new(db.clone());
    let mut ids = Vec::with_capacity(VARIANTS.len());

    for (sku, name, quantity, unit_cost) in VARIANTS {
        let variant = stock
            .create_variant(CreateVariantInput {
                sku: sku.to_string(),
                name: name.to_string(),
            })
            .await?;
        let variant_id = VariantId::from_uuid(variant.id);
        if quantity > 0 {
            stock
                .record_direct_placement(
                    variant_id,
                    quantity,
                    Decimal::from(unit_cost),
                    Some("opening stock".to_string()),
                )
                .await?;
        }
        ids.push(variant_id);
    }

    info!(variants = ids.len(), "variants seeded");
    Ok(ids)
}

/// A supplier with one fully received, invoiced purchase order.
async fn seed_purchasing(db: &DatabaseConnection, variants: &[VariantId]) -> anyhow::Result<()> {
    let purchases = PurchaseRepository::new(db.clone());

    let supplier = purchases.create_partner("Lumen Supply Co.").await?;
    let order = purchases
        .create_purchase_order(CreatePurchaseOrderInput {
            supplier_id: PartnerId::from_uuid(supplier.id),
            items: vec![CreatePurchaseOrderItemInput {
                variant_id: variants[2],
                quantity: 12,
                unit_price: Decimal::from(350),
            }],
        })
        .await?;

    let lines: Vec<ReceivingDraftLine> = order
        .lines
        .iter()
        .map(|line| ReceivingDraftLine {
            purchase_order_item_id: line.id,
            quantity: line.quantity,
        })
        .collect();
    purchases.record_receiving(order.id, &lines).await?;
    let invoice = purchases.register_invoice(order.id, order.total_charge).await?;
    purchases.record_expense(invoice.id, order.total_charge).await?;

    info!(purchase_order_id = %order.id, "purchasing seeded");
    Ok(())
}

/// A sales order with one approved fulfillment.
async fn seed_sales(db: &DatabaseConnection, variants: &[VariantId]) -> anyhow::Result<()> {
    let fulfillments = FulfillmentRepository::new(db.clone());

    let order = fulfillments
        .create_sales_order(vec![
            CreateSalesOrderItemInput {
                variant_id: variants[0],
                quantity: 4,
            },
            CreateSalesOrderItemInput {
                variant_id: variants[1],
                quantity: 2,
            },
        ])
        .await?;
    let lines: Vec<DraftLine> = order
        .items
        .iter()
        .map(|item| DraftLine {
            sales_order_item_id: item.id,
            quantity: item.quantity,
        })
        .collect();
    let fulfillment = fulfillments.create_fulfillment(order.id, &lines).await?;
    let outcome = fulfillments.approve_fulfillment(fulfillment.id).await?;

    info!(
        sales_order_id = %order.id,
        total_cost = %outcome.total_cost,
        "sales seeded"
    );
    Ok(())
}
