//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `LotId` where a `VariantId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(VariantId, "Unique identifier for an item variant.");
typed_id!(LotId, "Unique identifier for a stock lot.");
typed_id!(MovementId, "Unique identifier for a stock movement.");
typed_id!(PartnerId, "Unique identifier for a partner (supplier or customer).");
typed_id!(SalesOrderId, "Unique identifier for a sales order.");
typed_id!(SalesOrderItemId, "Unique identifier for a sales order line.");
typed_id!(FulfillmentId, "Unique identifier for a fulfillment.");
typed_id!(FulfillmentItemId, "Unique identifier for a fulfillment line.");
typed_id!(PurchaseOrderId, "Unique identifier for a purchase order.");
typed_id!(PurchaseOrderItemId, "Unique identifier for a purchase order line.");
typed_id!(PurchaseInvoiceId, "Unique identifier for a purchase invoice.");
typed_id!(FinanceExpenseId, "Unique identifier for a finance expense entry.");
typed_id!(ReceivingId, "Unique identifier for a receiving document.");
typed_id!(ReceivingItemId, "Unique identifier for a receiving line.");
typed_id!(DirectPlacementId, "Unique identifier for a direct stock placement.");
typed_id!(StockopnameId, "Unique identifier for a stock opname (physical count).");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = LotId::from_uuid(uuid);
        assert_eq!(id.into_inner(), uuid);
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn test_typed_id_display_and_parse() {
        let id = VariantId::new();
        let parsed = VariantId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
        assert!(VariantId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_typed_ids_are_time_ordered() {
        let first = LotId::new();
        let second = LotId::new();
        assert!(first < second);
    }

    #[test]
    fn test_typed_id_serde_transparent() {
        let uuid = Uuid::new_v4();
        let id = FulfillmentId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
