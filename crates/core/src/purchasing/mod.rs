//! Purchasing workflows for Stockflow.
//!
//! A purchase order replenishes stock through receivings and is paid through
//! invoices and their finance expenses. Cancelling it unwinds all of that.
//!
//! # Modules
//!
//! - `types` - Purchase-order, invoice, expense and receiving snapshots
//! - `error` - Purchasing-specific error types
//! - `cancellation` - Guarded cancellation with stock reversal and cascades
//! - `rollup` - Invoice, receiving and document status rollup
//! - `receiving` - Goods receipt against a purchase order
//! - `invoicing` - Invoice registration and expense clearing

pub mod cancellation;
pub mod error;
pub mod invoicing;
pub mod receiving;
pub mod rollup;
pub mod types;

#[cfg(test)]
mod rollup_props;

pub use cancellation::{CancellationPlan, PurchaseCancellation};
pub use error::PurchaseError;
pub use invoicing::PurchaseInvoicing;
pub use receiving::{PurchaseReceiving, ReceivingOutcome};
pub use rollup::{InvoiceTotals, PurchaseRollup, PurchaseStatusRollup};
pub use types::{
    ExpenseSnapshot, InvoiceSnapshot, PurchaseOrderLine, PurchaseOrderSnapshot, ReceivingDraftLine,
    ReceivingLine, ReceivingSnapshot,
};
