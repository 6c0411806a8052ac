//! `SeaORM` Entity for fulfillment_items table.
//!
//! `cost` stays empty until the fulfillment is approved.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use stockflow_core::fulfillment::FulfillmentLine;
use stockflow_shared::types::{FulfillmentItemId, SalesOrderItemId, VariantId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fulfillment_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub fulfillment_id: Uuid,
    pub sales_order_item_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub cost: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fulfillments::Entity",
        from = "Column::FulfillmentId",
        to = "super::fulfillments::Column::Id"
    )]
    Fulfillments,
    #[sea_orm(
        belongs_to = "super::sales_order_items::Entity",
        from = "Column::SalesOrderItemId",
        to = "super::sales_order_items::Column::Id"
    )]
    SalesOrderItems,
}

impl Related<super::fulfillments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fulfillments.def()
    }
}

impl Related<super::sales_order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for FulfillmentLine {
    fn from(model: Model) -> Self {
        Self {
            id: FulfillmentItemId::from_uuid(model.id),
            sales_order_item_id: SalesOrderItemId::from_uuid(model.sales_order_item_id),
            variant_id: VariantId::from_uuid(model.variant_id),
            quantity: model.quantity,
        }
    }
}
