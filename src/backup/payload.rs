//! The plaintext export document
//!
//! `{version, exportedAt, accounts, transactions, loans, subscriptions,
//! budgets, goals, recurringRules, creditCards}`. On import every table array
//! is optional; a missing array leaves that table alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{VaultError, VaultResult};
use crate::models::{
    Account, Budget, CreditCard, FinancialGoal, Loan, Record, RecurringRule, Subscription,
    TableName, Transaction,
};

/// Export format version this build reads and writes
pub const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    pub version: u32,
    pub exported_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<Account>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loans: Option<Vec<Loan>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriptions: Option<Vec<Subscription>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budgets: Option<Vec<Budget>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<FinancialGoal>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_rules: Option<Vec<RecurringRule>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_cards: Option<Vec<CreditCard>>,
}

impl BackupPayload {
    /// A payload with no tables at all
    pub fn empty() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            exported_at: Utc::now(),
            accounts: None,
            transactions: None,
            loans: None,
            subscriptions: None,
            budgets: None,
            goals: None,
            recurring_rules: None,
            credit_cards: None,
        }
    }

    /// Tables carried by this payload, in import order
    pub fn tables_present(&self) -> Vec<TableName> {
        let present = [
            (TableName::Accounts, self.accounts.is_some()),
            (TableName::Transactions, self.transactions.is_some()),
            (TableName::Loans, self.loans.is_some()),
            (TableName::Subscriptions, self.subscriptions.is_some()),
            (TableName::Budgets, self.budgets.is_some()),
            (TableName::Goals, self.goals.is_some()),
            (TableName::RecurringRules, self.recurring_rules.is_some()),
            (TableName::CreditCards, self.credit_cards.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(table, is_present)| is_present.then_some(table))
            .collect()
    }

    /// Number of records across every table
    pub fn record_count(&self) -> usize {
        fn len<T>(records: &Option<Vec<T>>) -> usize {
            records.as_ref().map_or(0, Vec::len)
        }
        len(&self.accounts)
            + len(&self.transactions)
            + len(&self.loans)
            + len(&self.subscriptions)
            + len(&self.budgets)
            + len(&self.goals)
            + len(&self.recurring_rules)
            + len(&self.credit_cards)
    }

    /// Reject a payload from another format version
    pub fn check_version(&self) -> VaultResult<()> {
        if self.version != SUPPORTED_VERSION {
            return Err(VaultError::VersionMismatch {
                expected: SUPPORTED_VERSION,
                found: i64::from(self.version),
            });
        }
        Ok(())
    }

    /// Structural checks on every record: non-empty ids, unique child ids
    pub fn validate(&self) -> VaultResult<()> {
        validate_table(&self.accounts)?;
        validate_table(&self.transactions)?;
        validate_table(&self.loans)?;
        validate_table(&self.subscriptions)?;
        validate_table(&self.budgets)?;
        validate_table(&self.goals)?;
        validate_table(&self.recurring_rules)?;
        validate_table(&self.credit_cards)?;
        Ok(())
    }

    /// Parse an export document, checking `version` before anything else
    pub fn from_json(text: &str) -> VaultResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| VaultError::MalformedPayload(format!("not valid JSON: {}", e)))?;

        let Some(document) = value.as_object() else {
            return Err(VaultError::MalformedPayload(
                "export document must be a JSON object".into(),
            ));
        };

        let found = document
            .get("version")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                VaultError::MalformedPayload("missing or non-integer \"version\" field".into())
            })?;
        if found != i64::from(SUPPORTED_VERSION) {
            return Err(VaultError::VersionMismatch {
                expected: SUPPORTED_VERSION,
                found,
            });
        }

        if document.contains_key("encrypted") {
            return Err(VaultError::MalformedPayload(
                "document is an encrypted export; decrypt it first".into(),
            ));
        }

        serde_json::from_value(value).map_err(|e| VaultError::MalformedPayload(e.to_string()))
    }

    pub fn to_json(&self, pretty: bool) -> VaultResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

fn validate_table<T: Record>(records: &Option<Vec<T>>) -> VaultResult<()> {
    for record in records.iter().flatten() {
        record.validate().map_err(VaultError::MalformedPayload)?;
    }
    Ok(())
}
