//! Stock ledger migration.
//!
//! Creates item variants, lots and the append-only movement ledger.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: VARIANTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ItemVariants::Table)
                    .if_not_exists()
                    .col(pk_uuid(ItemVariants::Id))
                    .col(string_len_uniq(ItemVariants::Sku, 64))
                    .col(string_len(ItemVariants::Name, 255))
                    .col(big_integer(ItemVariants::AvailableStock).default(0))
                    .col(big_integer(ItemVariants::CommittedStock).default(0))
                    .col(timestamp_with_time_zone(ItemVariants::CreatedAt))
                    .col(timestamp_with_time_zone(ItemVariants::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 2: LOTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Lots::Table)
                    .if_not_exists()
                    .col(pk_uuid(Lots::Id))
                    .col(uuid(Lots::VariantId))
                    .col(string_len_uniq(Lots::Code, 32))
                    .col(decimal_len(Lots::UnitCost, 16, 4))
                    .col(big_integer(Lots::Remaining).default(0))
                    .col(timestamp_with_time_zone(Lots::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lots_variant")
                            .from(Lots::Table, Lots::VariantId)
                            .to(ItemVariants::Table, ItemVariants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // FIFO scans read a variant's lots oldest first
        manager
            .create_index(
                Index::create()
                    .name("idx_lots_variant_fifo")
                    .table(Lots::Table)
                    .col(Lots::VariantId)
                    .col(Lots::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 3: MOVEMENT LEDGER
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .if_not_exists()
                    .col(pk_uuid(StockMovements::Id))
                    .col(uuid(StockMovements::LotId))
                    .col(big_integer(StockMovements::Sequence))
                    .col(string_len(StockMovements::Direction, 8))
                    .col(big_integer(StockMovements::Quantity))
                    .col(big_integer(StockMovements::RemainingAfter))
                    .col(string_len(StockMovements::ReferenceKind, 32))
                    .col(uuid(StockMovements::ReferenceId))
                    .col(uuid_null(StockMovements::ReversesMovementId))
                    .col(timestamp_with_time_zone(StockMovements::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_lot")
                            .from(StockMovements::Table, StockMovements::LotId)
                            .to(Lots::Table, Lots::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_reverses")
                            .from(StockMovements::Table, StockMovements::ReversesMovementId)
                            .to(StockMovements::Table, StockMovements::Id),
                    )
                    .check(Expr::col(StockMovements::Quantity).gt(0))
                    .check(Expr::col(StockMovements::RemainingAfter).gte(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_stock_movements_lot_sequence")
                    .table(StockMovements::Table)
                    .col(StockMovements::LotId)
                    .col(StockMovements::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_reference")
                    .table(StockMovements::Table)
                    .col(StockMovements::ReferenceKind)
                    .col(StockMovements::ReferenceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockMovements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ItemVariants::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(super) enum ItemVariants {
    Table,
    Id,
    Sku,
    Name,
    AvailableStock,
    CommittedStock,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Lots {
    Table,
    Id,
    VariantId,
    Code,
    UnitCost,
    Remaining,
    CreatedAt,
}

#[derive(DeriveIden)]
enum StockMovements {
    Table,
    Id,
    LotId,
    Sequence,
    Direction,
    Quantity,
    RemainingAfter,
    ReferenceKind,
    ReferenceId,
    ReversesMovementId,
    CreatedAt,
}
