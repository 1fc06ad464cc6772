//! Transaction model
//!
//! A single income, expense or transfer posted against an account.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, RecurringRuleId, TransactionId};
use super::record::{ensure_finite, index, Record, RecordMeta, TableName};

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    #[default]
    Expense,
    Transfer,
}

impl TransactionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A posted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,

    pub account_id: AccountId,

    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Amount in major units; the sign convention is carried by `kind`
    pub amount: f64,

    pub date: NaiveDate,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Set when the transaction was generated by a recurring rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_rule_id: Option<RecurringRuleId>,

    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Transaction {
    pub fn new(account_id: AccountId, kind: TransactionKind, amount: f64, date: NaiveDate) -> Self {
        Self {
            id: TransactionId::new(),
            account_id,
            kind,
            amount,
            date,
            description: String::new(),
            category: None,
            notes: None,
            recurring_rule_id: None,
            meta: RecordMeta::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Amount with the sign implied by the kind: income positive, expense negative
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount.abs(),
            TransactionKind::Expense => -self.amount.abs(),
            TransactionKind::Transfer => self.amount,
        }
    }
}

impl Record for Transaction {
    type Id = TransactionId;

    const TABLE: TableName = TableName::Transactions;

    fn id(&self) -> &TransactionId {
        &self.id
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            (index::ACCOUNT, self.account_id.to_string()),
            (index::DATE, self.date.to_string()),
        ];
        if let Some(category) = &self.category {
            entries.push((index::CATEGORY, category.clone()));
        }
        if let Some(rule_id) = &self.recurring_rule_id {
            entries.push((index::RECURRING_RULE, rule_id.to_string()));
        }
        entries
    }

    fn check(&self) -> Result<(), String> {
        if self.account_id.is_blank() {
            return Err("transaction must reference an account".into());
        }
        ensure_finite("amount", self.amount)
    }
}
