//! `SeaORM` Entity for direct_placements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "direct_placements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_cost: Decimal,
    pub note: Option<String>,
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
}

impl Related<super::item_variants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemVariants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
