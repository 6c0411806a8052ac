//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Each stock-moving operation loads a working set through `ledger`, runs the
//! matching core workflow and writes the result in one transaction.

pub mod fulfillment;
pub(crate) mod ledger;
pub mod purchase;
pub mod stock;

pub use fulfillment::{CreateSalesOrderItemInput, FulfillmentRepository};
pub use purchase::{CreatePurchaseOrderInput, CreatePurchaseOrderItemInput, PurchaseRepository};
pub use stock::{CreateVariantInput, DirectPlacementRecord, StockRepository, StockopnameRecord};
