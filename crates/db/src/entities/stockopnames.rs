//! `SeaORM` Entity for stockopnames table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stockopnames")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub variant_id: Uuid,
    pub recorded_quantity: i64,
    pub counted_quantity: i64,
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
