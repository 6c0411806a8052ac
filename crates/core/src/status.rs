//! Document status enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by fulfillments, sales orders, purchase orders,
/// invoices and receivings.
///
/// Documents progress `new → active → finished`; `cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Created, nothing happened yet.
    New,
    /// Work on the document has started.
    Active,
    /// The document is complete.
    Finished,
    /// The document was cancelled (terminal).
    Cancelled,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true once the document moved past `new`.
    #[must_use]
    pub fn has_progressed(&self) -> bool {
        !matches!(self, Self::New)
    }

    /// Marks work as started: `new` becomes `active`, anything else is kept.
    #[must_use]
    pub fn activate(self) -> Self {
        match self {
            Self::New => Self::Active,
            other => other,
        }
    }

    /// Settles a derived status against its completion condition.
    ///
    /// A satisfied condition yields `finished`. A `finished` status whose
    /// condition no longer holds steps back to `active`. Anything else is kept.
    #[must_use]
    pub fn settle(self, complete: bool) -> Self {
        match (self, complete) {
            (Self::Cancelled, _) => Self::Cancelled,
            (_, true) => Self::Finished,
            (Self::Finished, false) => Self::Active,
            (current, false) => current,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a finance expense (a payment against a purchase invoice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Recorded but not yet cleared by the bank.
    New,
    /// Cleared; counts towards the invoice's paid total.
    Cleared,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Cleared => "cleared",
        }
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DocumentStatus::New, "new")]
    #[case(DocumentStatus::Active, "active")]
    #[case(DocumentStatus::Finished, "finished")]
    #[case(DocumentStatus::Cancelled, "cancelled")]
    fn test_status_display(#[case] status: DocumentStatus, #[case] expected: &str) {
        assert_eq!(status.to_string(), expected);
    }

    #[test]
    fn test_expense_status_display() {
        assert_eq!(ExpenseStatus::New.to_string(), "new");
        assert_eq!(ExpenseStatus::Cleared.to_string(), "cleared");
    }

    #[rstest]
    #[case(DocumentStatus::New, true, DocumentStatus::Finished)]
    #[case(DocumentStatus::Active, true, DocumentStatus::Finished)]
    #[case(DocumentStatus::Finished, true, DocumentStatus::Finished)]
    #[case(DocumentStatus::New, false, DocumentStatus::New)]
    #[case(DocumentStatus::Active, false, DocumentStatus::Active)]
    #[case(DocumentStatus::Finished, false, DocumentStatus::Active)]
    #[case(DocumentStatus::Cancelled, true, DocumentStatus::Cancelled)]
    fn test_settle(
        #[case] current: DocumentStatus,
        #[case] complete: bool,
        #[case] expected: DocumentStatus,
    ) {
        assert_eq!(current.settle(complete), expected);
    }

    #[test]
    fn test_has_progressed() {
        assert!(!DocumentStatus::New.has_progressed());
        assert!(DocumentStatus::Active.has_progressed());
        assert!(DocumentStatus::Finished.has_progressed());
    }

    #[test]
    fn test_activate() {
        assert_eq!(DocumentStatus::New.activate(), DocumentStatus::Active);
        assert_eq!(DocumentStatus::Finished.activate(), DocumentStatus::Finished);
        assert_eq!(DocumentStatus::Cancelled.activate(), DocumentStatus::Cancelled);
    }
}
