//! String-backed enums shared by several tables.
//!
//! Stored as short strings rather than native enum types so the schema runs
//! unchanged on PostgreSQL and SQLite.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use stockflow_core::stock;

/// Lifecycle of a business document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "finished")]
    Finished,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Clearing state of a finance expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ExpenseStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "cleared")]
    Cleared,
}

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum MovementDirection {
    #[sea_orm(string_value = "in")]
    In,
    #[sea_orm(string_value = "out")]
    Out,
}

/// Kind of document a stock movement references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ReferenceKind {
    #[sea_orm(string_value = "receiving")]
    Receiving,
    #[sea_orm(string_value = "direct_placement")]
    DirectPlacement,
    #[sea_orm(string_value = "stockopname")]
    Stockopname,
    #[sea_orm(string_value = "purchase_order")]
    PurchaseOrder,
    #[sea_orm(string_value = "fulfillment")]
    Fulfillment,
}

impl From<DocumentStatus> for stockflow_core::DocumentStatus {
    fn from(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::New => Self::New,
            DocumentStatus::Active => Self::Active,
            DocumentStatus::Finished => Self::Finished,
            DocumentStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<stockflow_core::DocumentStatus> for DocumentStatus {
    fn from(status: stockflow_core::DocumentStatus) -> Self {
        match status {
            stockflow_core::DocumentStatus::New => Self::New,
            stockflow_core::DocumentStatus::Active => Self::Active,
            stockflow_core::DocumentStatus::Finished => Self::Finished,
            stockflow_core::DocumentStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<ExpenseStatus> for stockflow_core::ExpenseStatus {
    fn from(status: ExpenseStatus) -> Self {
        match status {
            ExpenseStatus::New => Self::New,
            ExpenseStatus::Cleared => Self::Cleared,
        }
    }
}

impl From<stockflow_core::ExpenseStatus> for ExpenseStatus {
    fn from(status: stockflow_core::ExpenseStatus) -> Self {
        match status {
            stockflow_core::ExpenseStatus::New => Self::New,
            stockflow_core::ExpenseStatus::Cleared => Self::Cleared,
        }
    }
}

impl From<MovementDirection> for stock::MovementDirection {
    fn from(direction: MovementDirection) -> Self {
        match direction {
            MovementDirection::In => Self::In,
            MovementDirection::Out => Self::Out,
        }
    }
}

impl From<stock::MovementDirection> for MovementDirection {
    fn from(direction: stock::MovementDirection) -> Self {
        match direction {
            stock::MovementDirection::In => Self::In,
            stock::MovementDirection::Out => Self::Out,
        }
    }
}

impl From<ReferenceKind> for stock::ReferenceKind {
    fn from(kind: ReferenceKind) -> Self {
        match kind {
            ReferenceKind::Receiving => Self::Receiving,
            ReferenceKind::DirectPlacement => Self::DirectPlacement,
            ReferenceKind::Stockopname => Self::Stockopname,
            ReferenceKind::PurchaseOrder => Self::PurchaseOrder,
            ReferenceKind::Fulfillment => Self::Fulfillment,
        }
    }
}

impl From<stock::ReferenceKind> for ReferenceKind {
    fn from(kind: stock::ReferenceKind) -> Self {
        match kind {
            stock::ReferenceKind::Receiving => Self::Receiving,
            stock::ReferenceKind::DirectPlacement => Self::DirectPlacement,
            stock::ReferenceKind::Stockopname => Self::Stockopname,
            stock::ReferenceKind::PurchaseOrder => Self::PurchaseOrder,
            stock::ReferenceKind::Fulfillment => Self::Fulfillment,
        }
    }
}
