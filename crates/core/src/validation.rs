//! Line validation against outstanding quantities.
//!
//! Fulfillments draw against sales-order lines and receivings draw against
//! purchase-order lines. Both check the same things: at least one line, positive
//! quantities, lines that belong to the parent document, and a cumulative
//! quantity per parent line that stays within what is still outstanding.
//! All failures are collected instead of stopping at the first.

use std::collections::BTreeMap;

use stockflow_shared::ValidationErrors;

/// One requested line, keyed by the parent document line it draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRequest<K> {
    /// Parent line the request draws from.
    pub key: K,
    /// Requested quantity.
    pub quantity: i64,
}

/// Outstanding quantity of a parent line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outstanding {
    /// Quantity ordered on the parent line.
    pub ordered: i64,
    /// Quantity already fulfilled or received.
    pub consumed: i64,
}

impl Outstanding {
    /// Quantity that may still be requested.
    #[must_use]
    pub const fn remaining(&self) -> i64 {
        self.ordered - self.consumed
    }
}

/// Validates requested lines against the parent document.
///
/// `key_field` names the per-line key in error paths, e.g. `sales_order_item_id`.
///
/// # Errors
///
/// Returns every failed check at once.
pub fn validate_lines<K: Ord + Copy>(
    lines: &[LineRequest<K>],
    outstanding: &BTreeMap<K, Outstanding>,
    key_field: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if lines.is_empty() {
        errors.add("lines", "REQUIRED", "at least one line is required");
    }

    let mut requested: BTreeMap<K, i64> = BTreeMap::new();
    for (index, line) in lines.iter().enumerate() {
        let quantity_field = format!("lines[{index}].quantity");

        if line.quantity <= 0 {
            errors.add(quantity_field.clone(), "NOT_POSITIVE", "quantity must be positive");
        }

        let Some(limit) = outstanding.get(&line.key) else {
            errors.add(
                format!("lines[{index}].{key_field}"),
                "UNKNOWN_LINE",
                "line does not belong to the document",
            );
            continue;
        };

        if line.quantity > 0 {
            let total = requested.entry(line.key).or_insert(0);
            let earlier = *total;
            let sum = earlier.checked_add(line.quantity);
            *total = sum.unwrap_or(i64::MAX);
            if sum.is_none_or(|sum| sum > limit.remaining()) {
                errors.add(
                    quantity_field,
                    "EXCEEDS_OUTSTANDING",
                    format!(
                        "requested {} exceeds outstanding {}",
                        i128::from(earlier) + i128::from(line.quantity),
                        limit.remaining().max(0)
                    ),
                );
            }
        }
    }

    errors.into_result()
}
