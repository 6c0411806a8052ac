//! Business documents migration.
//!
//! Creates partners, sales orders and fulfillments, purchase orders with
//! their invoices, expenses and receivings, and the stock adjustment documents.

use sea_orm_migration::{prelude::*, schema::*};

use super::m20260901_000001_stock_ledger::{ItemVariants, Lots};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: PARTNERS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Partners::Table)
                    .if_not_exists()
                    .col(pk_uuid(Partners::Id))
                    .col(string_len(Partners::Name, 255))
                    .col(decimal_len(Partners::TotalExpenditure, 16, 4).default(0))
                    .col(decimal_len(Partners::TotalCredit, 16, 4).default(0))
                    .col(timestamp_with_time_zone(Partners::CreatedAt))
                    .col(timestamp_with_time_zone(Partners::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 2: SALES & FULFILLMENT
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(SalesOrders::Table)
                    .if_not_exists()
                    .col(pk_uuid(SalesOrders::Id))
                    .col(string_len(SalesOrders::Status, 16))
                    .col(decimal_len(SalesOrders::TotalCost, 16, 4).default(0))
                    .col(boolean(SalesOrders::IsDeleted).default(false))
                    .col(timestamp_with_time_zone(SalesOrders::CreatedAt))
                    .col(timestamp_with_time_zone(SalesOrders::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SalesOrderItems::Table)
                    .if_not_exists()
                    .col(pk_uuid(SalesOrderItems::Id))
                    .col(uuid(SalesOrderItems::SalesOrderId))
                    .col(uuid(SalesOrderItems::VariantId))
                    .col(big_integer(SalesOrderItems::Quantity))
                    .col(big_integer(SalesOrderItems::FulfilledQuantity).default(0))
                    .col(boolean(SalesOrderItems::IsDeleted).default(false))
                    .col(timestamp_with_time_zone(SalesOrderItems::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_order_items_order")
                            .from(SalesOrderItems::Table, SalesOrderItems::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_order_items_variant")
                            .from(SalesOrderItems::Table, SalesOrderItems::VariantId)
                            .to(ItemVariants::Table, ItemVariants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Fulfillments::Table)
                    .if_not_exists()
                    .col(pk_uuid(Fulfillments::Id))
                    .col(uuid(Fulfillments::SalesOrderId))
                    .col(string_len(Fulfillments::Status, 16))
                    .col(decimal_len(Fulfillments::TotalCost, 16, 4).default(0))
                    .col(timestamp_with_time_zone_null(Fulfillments::ApprovedAt))
                    .col(boolean(Fulfillments::IsDeleted).default(false))
                    .col(timestamp_with_time_zone(Fulfillments::CreatedAt))
                    .col(timestamp_with_time_zone(Fulfillments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fulfillments_sales_order")
                            .from(Fulfillments::Table, Fulfillments::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FulfillmentItems::Table)
                    .if_not_exists()
                    .col(pk_uuid(FulfillmentItems::Id))
                    .col(uuid(FulfillmentItems::FulfillmentId))
                    .col(uuid(FulfillmentItems::SalesOrderItemId))
                    .col(uuid(FulfillmentItems::VariantId))
                    .col(big_integer(FulfillmentItems::Quantity))
                    .col(decimal_len_null(FulfillmentItems::Cost, 16, 4))
                    .col(timestamp_with_time_zone(FulfillmentItems::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fulfillment_items_fulfillment")
                            .from(FulfillmentItems::Table, FulfillmentItems::FulfillmentId)
                            .to(Fulfillments::Table, Fulfillments::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fulfillment_items_sales_order_item")
                            .from(FulfillmentItems::Table, FulfillmentItems::SalesOrderItemId)
                            .to(SalesOrderItems::Table, SalesOrderItems::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 3: PURCHASING
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(pk_uuid(PurchaseOrders::Id))
                    .col(uuid(PurchaseOrders::SupplierId))
                    .col(string_len(PurchaseOrders::Status, 16))
                    .col(string_len(PurchaseOrders::InvoiceStatus, 16))
                    .col(string_len(PurchaseOrders::ReceivingStatus, 16))
                    .col(decimal_len(PurchaseOrders::TotalCharge, 16, 4))
                    .col(decimal_len(PurchaseOrders::TotalPaid, 16, 4).default(0))
                    .col(text_null(PurchaseOrders::CancellationNote))
                    .col(boolean(PurchaseOrders::IsDeleted).default(false))
                    .col(timestamp_with_time_zone(PurchaseOrders::CreatedAt))
                    .col(timestamp_with_time_zone(PurchaseOrders::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_supplier")
                            .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                            .to(Partners::Table, Partners::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrderItems::Table)
                    .if_not_exists()
                    .col(pk_uuid(PurchaseOrderItems::Id))
                    .col(uuid(PurchaseOrderItems::PurchaseOrderId))
                    .col(uuid(PurchaseOrderItems::VariantId))
                    .col(big_integer(PurchaseOrderItems::Quantity))
                    .col(decimal_len(PurchaseOrderItems::UnitPrice, 16, 4))
                    .col(timestamp_with_time_zone(PurchaseOrderItems::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_order_items_order")
                            .from(PurchaseOrderItems::Table, PurchaseOrderItems::PurchaseOrderId)
                            .to(PurchaseOrders::Table, PurchaseOrders::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_order_items_variant")
                            .from(PurchaseOrderItems::Table, PurchaseOrderItems::VariantId)
                            .to(ItemVariants::Table, ItemVariants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseInvoices::Table)
                    .if_not_exists()
                    .col(pk_uuid(PurchaseInvoices::Id))
                    .col(uuid(PurchaseInvoices::PurchaseOrderId))
                    .col(decimal_len(PurchaseInvoices::TotalAmount, 16, 4))
                    .col(decimal_len(PurchaseInvoices::TotalPaid, 16, 4).default(0))
                    .col(string_len(PurchaseInvoices::Status, 16))
                    .col(boolean(PurchaseInvoices::IsDeleted).default(false))
                    .col(timestamp_with_time_zone(PurchaseInvoices::CreatedAt))
                    .col(timestamp_with_time_zone(PurchaseInvoices::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_invoices_order")
                            .from(PurchaseInvoices::Table, PurchaseInvoices::PurchaseOrderId)
                            .to(PurchaseOrders::Table, PurchaseOrders::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FinanceExpenses::Table)
                    .if_not_exists()
                    .col(pk_uuid(FinanceExpenses::Id))
                    .col(uuid(FinanceExpenses::PurchaseInvoiceId))
                    .col(decimal_len(FinanceExpenses::Amount, 16, 4))
                    .col(string_len(FinanceExpenses::Status, 16))
                    .col(boolean(FinanceExpenses::IsDeleted).default(false))
                    .col(timestamp_with_time_zone(FinanceExpenses::CreatedAt))
                    .col(timestamp_with_time_zone(FinanceExpenses::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_finance_expenses_invoice")
                            .from(FinanceExpenses::Table, FinanceExpenses::PurchaseInvoiceId)
                            .to(PurchaseInvoices::Table, PurchaseInvoices::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Receivings::Table)
                    .if_not_exists()
                    .col(pk_uuid(Receivings::Id))
                    .col(uuid(Receivings::PurchaseOrderId))
                    .col(boolean(Receivings::IsDeleted).default(false))
                    .col(timestamp_with_time_zone(Receivings::CreatedAt))
                    .col(timestamp_with_time_zone(Receivings::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receivings_order")
                            .from(Receivings::Table, Receivings::PurchaseOrderId)
                            .to(PurchaseOrders::Table, PurchaseOrders::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReceivingItems::Table)
                    .if_not_exists()
                    .col(pk_uuid(ReceivingItems::Id))
                    .col(uuid(ReceivingItems::ReceivingId))
                    .col(uuid(ReceivingItems::PurchaseOrderItemId))
                    .col(uuid(ReceivingItems::VariantId))
                    .col(big_integer(ReceivingItems::Quantity))
                    .col(decimal_len(ReceivingItems::UnitCost, 16, 4))
                    .col(uuid_null(ReceivingItems::LotId))
                    .col(timestamp_with_time_zone(ReceivingItems::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receiving_items_receiving")
                            .from(ReceivingItems::Table, ReceivingItems::ReceivingId)
                            .to(Receivings::Table, Receivings::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receiving_items_order_item")
                            .from(ReceivingItems::Table, ReceivingItems::PurchaseOrderItemId)
                            .to(PurchaseOrderItems::Table, PurchaseOrderItems::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receiving_items_lot")
                            .from(ReceivingItems::Table, ReceivingItems::LotId)
                            .to(Lots::Table, Lots::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 4: STOCK ADJUSTMENTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(DirectPlacements::Table)
                    .if_not_exists()
                    .col(pk_uuid(DirectPlacements::Id))
                    .col(uuid(DirectPlacements::VariantId))
                    .col(big_integer(DirectPlacements::Quantity))
                    .col(decimal_len(DirectPlacements::UnitCost, 16, 4))
                    .col(text_null(DirectPlacements::Note))
                    .col(timestamp_with_time_zone(DirectPlacements::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_direct_placements_variant")
                            .from(DirectPlacements::Table, DirectPlacements::VariantId)
                            .to(ItemVariants::Table, ItemVariants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Stockopnames::Table)
                    .if_not_exists()
                    .col(pk_uuid(Stockopnames::Id))
                    .col(uuid(Stockopnames::VariantId))
                    .col(big_integer(Stockopnames::RecordedQuantity))
                    .col(big_integer(Stockopnames::CountedQuantity))
                    .col(text_null(Stockopnames::Note))
                    .col(timestamp_with_time_zone(Stockopnames::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stockopnames_variant")
                            .from(Stockopnames::Table, Stockopnames::VariantId)
                            .to(ItemVariants::Table, ItemVariants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stockopnames::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DirectPlacements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReceivingItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Receivings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FinanceExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseInvoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseOrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FulfillmentItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Fulfillments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalesOrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Partners::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Partners {
    Table,
    Id,
    Name,
    TotalExpenditure,
    TotalCredit,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SalesOrders {
    Table,
    Id,
    Status,
    TotalCost,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SalesOrderItems {
    Table,
    Id,
    SalesOrderId,
    VariantId,
    Quantity,
    FulfilledQuantity,
    IsDeleted,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Fulfillments {
    Table,
    Id,
    SalesOrderId,
    Status,
    TotalCost,
    ApprovedAt,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FulfillmentItems {
    Table,
    Id,
    FulfillmentId,
    SalesOrderItemId,
    VariantId,
    Quantity,
    Cost,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PurchaseOrders {
    Table,
    Id,
    SupplierId,
    Status,
    InvoiceStatus,
    ReceivingStatus,
    TotalCharge,
    TotalPaid,
    CancellationNote,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PurchaseOrderItems {
    Table,
    Id,
    PurchaseOrderId,
    VariantId,
    Quantity,
    UnitPrice,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PurchaseInvoices {
    Table,
    Id,
    PurchaseOrderId,
    TotalAmount,
    TotalPaid,
    Status,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FinanceExpenses {
    Table,
    Id,
    PurchaseInvoiceId,
    Amount,
    Status,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Receivings {
    Table,
    Id,
    PurchaseOrderId,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ReceivingItems {
    Table,
    Id,
    ReceivingId,
    PurchaseOrderItemId,
    VariantId,
    Quantity,
    UnitCost,
    LotId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DirectPlacements {
    Table,
    Id,
    VariantId,
    Quantity,
    UnitCost,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Stockopnames {
    Table,
    Id,
    VariantId,
    RecordedQuantity,
    CountedQuantity,
    Note,
    CreatedAt,
}
