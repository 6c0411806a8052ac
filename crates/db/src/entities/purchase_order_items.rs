//! `SeaORM` Entity for purchase_order_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use stockflow_core::purchasing::PurchaseOrderLine;
use stockflow_shared::types::{PurchaseOrderItemId, VariantId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_price: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_orders::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_orders::Column::Id"
    )]
    PurchaseOrders,
    #[sea_orm(
        belongs_to = "super::item_variants::Entity",
        from = "Column::VariantId",
        to = "super::item_variants::Column::Id"
    )]
    ItemVariants,
}

impl Related<super::purchase_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

impl Related<super::item_variants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemVariants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PurchaseOrderLine {
    fn from(model: Model) -> Self {
        Self {
            id: PurchaseOrderItemId::from_uuid(model.id),
            variant_id: VariantId::from_uuid(model.variant_id),
            quantity: model.quantity,
            unit_price: model.unit_price,
        }
    }
}
