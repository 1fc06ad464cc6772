//! Strongly-typed ID wrappers for all entity types
//!
//! Ids are opaque strings on the wire so that exports produced elsewhere import
//! unchanged; new ids are random UUIDs. Newtype wrappers prevent mixing up ids
//! from different tables at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Wrap an existing identifier
            pub fn from_raw(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Get the identifier text
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

define_id!(AccountId);
define_id!(TransactionId);
define_id!(LoanId);
define_id!(LoanPaymentId);
define_id!(SubscriptionId);
define_id!(BudgetId);
define_id!(GoalId);
define_id!(RecurringRuleId);
define_id!(CreditCardId);
define_id!(CardTransactionId);
