//! `SeaORM` Entity for receiving_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use stockflow_core::purchasing::ReceivingLine;
use stockflow_shared::types::{PurchaseOrderItemId, ReceivingItemId, VariantId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "receiving_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub receiving_id: Uuid,
    pub purchase_order_item_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_cost: Decimal,
    pub lot_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::receivings::Entity",
        from = "Column::ReceivingId",
        to = "super::receivings::Column::Id"
    )]
    Receivings,
    #[sea_orm(
        belongs_to = "super::purchase_order_items::Entity",
        from = "Column::PurchaseOrderItemId",
        to = "super::purchase_order_items::Column::Id"
    )]
    PurchaseOrderItems,
}

impl Related<super::receivings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receivings.def()
    }
}

impl Related<super::purchase_order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ReceivingLine {
    fn from(model: Model) -> Self {
        Self {
            id: ReceivingItemId::from_uuid(model.id),
            purchase_order_item_id: PurchaseOrderItemId::from_uuid(model.purchase_order_item_id),
            variant_id: VariantId::from_uuid(model.variant_id),
            quantity: model.quantity,
            unit_cost: model.unit_cost,
        }
    }
}
