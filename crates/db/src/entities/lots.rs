//! `SeaORM` Entity for lots table.

use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use stockflow_core::stock::Lot;
use stockflow_shared::types::{LotId, VariantId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "lots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub variant_id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_cost: Decimal,
    pub remaining: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item_variants::Entity",
        from = "Column::VariantId",
        to = "super::item_variants::Column::Id"
    )]
    ItemVariants,
    #[sea_orm(has_many = "super::stock_movements::Entity")]
    StockMovements,
}

impl Related<super::item_variants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemVariants.def()
    }
}

impl Related<super::stock_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Lot {
    fn from(model: Model) -> Self {
        Self {
            id: LotId::from_uuid(model.id),
            variant_id: VariantId::from_uuid(model.variant_id),
            code: model.code,
            unit_cost: model.unit_cost,
            created_at: model.created_at.with_timezone(&Utc),
            remaining: model.remaining,
        }
    }
}
