//! Stock ledger for Stockflow.
//!
//! Stock is tracked per lot. Every change to a lot's remaining quantity is an
//! append-only movement tagged with the business document that caused it.
//!
//! # Modules
//!
//! - `types` - Lots, movements, references and variant stock
//! - `error` - Stock-specific error types
//! - `allocator` - FIFO allocation of outbound quantities across lots
//! - `aggregate` - Remaining and available quantities derived from movements
//! - `book` - In-memory working set that records stock-in and stock-out
//! - `reversal` - Compensating movements for a business document
//! - `opname` - Adjusting stock to a physical count

pub mod aggregate;
pub mod allocator;
pub mod book;
pub mod error;
pub mod opname;
pub mod reversal;
pub mod types;

#[cfg(test)]
mod book_props;

pub use aggregate::{Replay, StockAggregator};
pub use allocator::{LotAllocation, LotAllocator};
pub use book::{StockBook, StockChanges, StockIn, StockOut};
pub use error::StockError;
pub use opname::{CountAdjustment, StockCount};
pub use reversal::ReversalEngine;
pub use types::{
    Lot, Movement, MovementDirection, ReferenceKind, StockInRequest, StockReference, VariantStock,
};
