//! `SeaORM` Entity for item_variants table.
//!
//! `available_stock` is a cache of Σ remaining over the variant's lots.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use stockflow_core::stock::VariantStock;
use stockflow_shared::types::VariantId;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "item_variants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub sku: String,
    pub name: String,
    pub available_stock: i64,
    pub committed_stock: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::lots::Entity")]
    Lots,
}

impl Related<super::lots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Model> for VariantStock {
    fn from(model: &Model) -> Self {
        Self {
            variant_id: VariantId::from_uuid(model.id),
            available: model.available_stock,
            committed: model.committed_stock,
        }
    }
}
