//! Entity re-exports.

pub use super::direct_placements::Entity as DirectPlacements;
pub use super::finance_expenses::Entity as FinanceExpenses;
pub use super::fulfillment_items::Entity as FulfillmentItems;
pub use super::fulfillments::Entity as Fulfillments;
pub use super::item_variants::Entity as ItemVariants;
pub use super::lots::Entity as Lots;
pub use super::partners::Entity as Partners;
pub use super::purchase_invoices::Entity as PurchaseInvoices;
pub use super::purchase_order_items::Entity as PurchaseOrderItems;
pub use super::purchase_orders::Entity as PurchaseOrders;
pub use super::receiving_items::Entity as ReceivingItems;
pub use super::receivings::Entity as Receivings;
pub use super::sales_order_items::Entity as SalesOrderItems;
pub use super::sales_orders::Entity as SalesOrders;
pub use super::stock_movements::Entity as StockMovements;
pub use super::stockopnames::Entity as Stockopnames;
