//! Core business logic for Stockflow.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Workflows run against an in-memory working set of the stock ledger and return
//! everything they changed, so the persistence layer can apply the result in one
//! database transaction.
//!
//! # Modules
//!
//! - `stock` - Lots, movements, FIFO allocation, aggregates and reversal
//! - `fulfillment` - Fulfillment drafting and approval, sales-order rollup
//! - `purchasing` - Purchase-order cancellation, receiving, invoicing and status rollup
//! - `status` - Document status enumerations shared by all documents
//! - `validation` - Accumulating line validation against outstanding quantities

pub mod fulfillment;
pub mod purchasing;
pub mod status;
pub mod stock;
pub mod validation;

pub use status::{DocumentStatus, ExpenseStatus};
