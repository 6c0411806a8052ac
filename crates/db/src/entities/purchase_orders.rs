//! `SeaORM` Entity for purchase_orders table.
//!
//! An order tracks three statuses: the document status plus separate
//! invoicing and receiving progress.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::DocumentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub status: DocumentStatus,
    pub invoice_status: DocumentStatus,
    pub receiving_status: DocumentStatus,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_charge: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_paid: Decimal,
    pub cancellation_note: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::partners::Entity",
        from = "Column::SupplierId",
        to = "super::partners::Column::Id"
    )]
    Partners,
    #[sea_orm(has_many = "super::purchase_order_items::Entity")]
    PurchaseOrderItems,
    #[sea_orm(has_many = "super::purchase_invoices::Entity")]
    PurchaseInvoices,
    #[sea_orm(has_many = "super::receivings::Entity")]
    Receivings,
}

impl Related<super::partners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partners.def()
    }
}

impl Related<super::purchase_order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderItems.def()
    }
}

impl Related<super::purchase_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseInvoices.def()
    }
}

impl Related<super::receivings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receivings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
