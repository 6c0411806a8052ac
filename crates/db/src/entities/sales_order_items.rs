//! `SeaORM` Entity for sales_order_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use stockflow_core::fulfillment::SalesOrderLine;
use stockflow_shared::types::{SalesOrderItemId, VariantId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sales_order_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    pub fulfilled_quantity: i64,
    pub is_deleted: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales_orders::Entity",
        from = "Column::SalesOrderId",
        to = "super::sales_orders::Column::Id"
    )]
    SalesOrders,
    #[sea_orm(
        belongs_to = "super::item_variants::Entity",
        from = "Column::VariantId",
        to = "super::item_variants::Column::Id"
    )]
    ItemVariants,
}

impl Related<super::sales_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrders.def()
    }
}

impl Related<super::item_variants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemVariants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SalesOrderLine {
    fn from(model: Model) -> Self {
        Self {
            id: SalesOrderItemId::from_uuid(model.id),
            variant_id: VariantId::from_uuid(model.variant_id),
            quantity: model.quantity,
            fulfilled_quantity: model.fulfilled_quantity,
            is_deleted: model.is_deleted,
        }
    }
}
