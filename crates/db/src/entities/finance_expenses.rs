//! `SeaORM` Entity for finance_expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use stockflow_core::purchasing::ExpenseSnapshot;
use stockflow_shared::types::FinanceExpenseId;

use super::sea_orm_active_enums::ExpenseStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "finance_expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub purchase_invoice_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub status: ExpenseStatus,
    pub is_deleted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_invoices::Entity",
        from = "Column::PurchaseInvoiceId",
        to = "super::purchase_invoices::Column::Id"
    )]
    PurchaseInvoices,
}

impl Related<super::purchase_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseInvoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ExpenseSnapshot {
    fn from(model: Model) -> Self {
        Self {
            id: FinanceExpenseId::from_uuid(model.id),
            amount: model.amount,
            status: model.status.into(),
            is_deleted: model.is_deleted,
        }
    }
}
