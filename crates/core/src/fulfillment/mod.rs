//! Fulfillment workflows for Stockflow.
//!
//! A fulfillment ships sales-order lines out of stock. Drafting validates the
//! requested lines; approval checks stock feasibility, draws stock FIFO, costs
//! each line and rolls the result up into the sales order.
//!
//! # Modules
//!
//! - `types` - Fulfillment and sales-order domain types
//! - `error` - Fulfillment-specific error types
//! - `draft` - Validation of a new fulfillment against its sales order
//! - `approval` - Guard, feasibility check and commit of an approval
//! - `rollup` - Sales-order fulfilled quantities and status

pub mod approval;
pub mod draft;
pub mod error;
pub mod rollup;
pub mod types;

#[cfg(test)]
mod approval_props;

pub use approval::{ApprovalOutcome, FulfillmentApproval, LineCost};
pub use draft::FulfillmentDraft;
pub use error::FulfillmentError;
pub use rollup::SalesOrderRollup;
pub use types::{DraftLine, Fulfillment, FulfillmentLine, SalesOrderLine, SalesOrderProgress};
