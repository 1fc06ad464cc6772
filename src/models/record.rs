//! Shared record metadata and the `Record` trait
//!
//! Every stored entity carries an id, creation and modification timestamps and
//! an optional tombstone. The store is generic over `Record`, so the tables,
//! the backup codec and the named queries all work the same way for every
//! entity kind.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// The tables held by the store, in backup-document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableName {
    Accounts,
    Transactions,
    Loans,
    Subscriptions,
    Budgets,
    Goals,
    RecurringRules,
    CreditCards,
}

impl TableName {
    /// Every table, in the order imports apply them
    pub const ALL: [TableName; 8] = [
        TableName::Accounts,
        TableName::Transactions,
        TableName::Loans,
        TableName::Subscriptions,
        TableName::Budgets,
        TableName::Goals,
        TableName::RecurringRules,
        TableName::CreditCards,
    ];

    /// Key used both for the backup document field and the table's file name
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Transactions => "transactions",
            Self::Loans => "loans",
            Self::Subscriptions => "subscriptions",
            Self::Budgets => "budgets",
            Self::Goals => "goals",
            Self::RecurringRules => "recurringRules",
            Self::CreditCards => "creditCards",
        }
    }

    /// Singular entity name used in error messages
    pub const fn entity_name(&self) -> &'static str {
        match self {
            Self::Accounts => "Account",
            Self::Transactions => "Transaction",
            Self::Loans => "Loan",
            Self::Subscriptions => "Subscription",
            Self::Budgets => "Budget",
            Self::Goals => "Goal",
            Self::RecurringRules => "Recurring rule",
            Self::CreditCards => "Credit card",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Timestamps and tombstone shared by every record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RecordMeta {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Advance `updated_at` to now; never moves it backwards
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn mark_deleted(&mut self) {
        self.touch();
        self.deleted_at = Some(self.updated_at);
    }

    pub fn clear_deleted(&mut self) {
        self.touch();
        self.deleted_at = None;
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of secondary indexes
pub mod index {
    pub const ACCOUNT: &str = "accountId";
    pub const ACTIVE: &str = "active";
    pub const CATEGORY: &str = "category";
    pub const CURRENCY: &str = "currency";
    pub const DATE: &str = "date";
    pub const DUE_DATE: &str = "dueDate";
    pub const KIND: &str = "type";
    pub const NEXT_BILLING: &str = "nextBillingDate";
    pub const NEXT_RUN: &str = "nextRunDate";
    pub const PERIOD: &str = "period";
    pub const RECURRING_RULE: &str = "recurringRuleId";
    pub const STATUS: &str = "status";
    pub const TARGET_DATE: &str = "targetDate";
}

/// A stored entity
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Clone + Ord + AsRef<str> + fmt::Display + fmt::Debug + Send + Sync;

    const TABLE: TableName;

    fn id(&self) -> &Self::Id;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Secondary index entries as `(index name, key)` pairs.
    ///
    /// Keys for dates are `YYYY-MM-DD` so that lexical order is date order.
    fn index_entries(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Entity-specific structural checks
    fn check(&self) -> Result<(), String> {
        Ok(())
    }

    fn is_deleted(&self) -> bool {
        self.meta().is_deleted()
    }

    /// Full structural validation run on every write
    fn validate(&self) -> Result<(), String> {
        if self.id().as_ref().trim().is_empty() {
            return Err(format!("{} has an empty id", Self::TABLE.entity_name()));
        }
        self.check()
            .map_err(|e| format!("{} {}: {}", Self::TABLE.entity_name(), self.id(), e))
    }
}

/// Check that embedded child ids are unique within their parent
pub(crate) fn ensure_unique_children<'a, I>(kind: &str, ids: I) -> Result<(), String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::BTreeSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(format!("{} with an empty id", kind));
        }
        if !seen.insert(id) {
            return Err(format!("duplicate {} id {}", kind, id));
        }
    }
    Ok(())
}

/// Reject NaN and infinities, which JSON cannot represent
pub(crate) fn ensure_finite(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{} must be a finite number", field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_keys_round_trip() {
        for table in TableName::ALL {
            assert_eq!(TableName::from_key(table.key()), Some(table));
        }
        assert_eq!(TableName::from_key("payees"), None);
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut meta = RecordMeta::new();
        let future = Utc::now() + chrono::Duration::hours(1);
        meta.updated_at = future;
        meta.touch();
        assert_eq!(meta.updated_at, future);
    }

    #[test]
    fn test_tombstone_lifecycle() {
        let mut meta = RecordMeta::new();
        assert!(!meta.is_deleted());

        meta.mark_deleted();
        assert!(meta.is_deleted());
        assert_eq!(meta.deleted_at, Some(meta.updated_at));

        meta.clear_deleted();
        assert!(!meta.is_deleted());
    }

    #[test]
    fn test_meta_wire_format() {
        let meta = RecordMeta::new();
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("deletedAt").is_none());
    }

    #[test]
    fn test_unique_children() {
        assert!(ensure_unique_children("payment", ["a", "b"]).is_ok());
        assert!(ensure_unique_children("payment", ["a", "a"]).is_err());
        assert!(ensure_unique_children("payment", [""]).is_err());
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite("amount", 12.5).is_ok());
        assert!(ensure_finite("amount", f64::NAN).is_err());
        assert!(ensure_finite("amount", f64::NEG_INFINITY).is_err());
    }
}
