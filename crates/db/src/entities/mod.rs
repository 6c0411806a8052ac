//! `SeaORM` entity definitions.
//!
//! Stock ledger tables (`item_variants`, `lots`, `stock_movements`) plus the
//! sales and purchasing documents whose workflows move stock.

pub mod prelude;

pub mod direct_placements;
pub mod finance_expenses;
pub mod fulfillment_items;
pub mod fulfillments;
pub mod item_variants;
pub mod lots;
pub mod partners;
pub mod purchase_invoices;
pub mod purchase_order_items;
pub mod purchase_orders;
pub mod receiving_items;
pub mod receivings;
pub mod sales_order_items;
pub mod sales_orders;
pub mod sea_orm_active_enums;
pub mod stock_movements;
pub mod stockopnames;
